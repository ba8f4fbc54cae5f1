pub mod fs_output_placer;
pub mod sequential_batch_executor;
pub mod threaded_batch_executor;
