pub mod box_annotator;
pub mod image_file_reader;
pub mod image_file_writer;
