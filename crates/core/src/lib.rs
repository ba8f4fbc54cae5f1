pub mod shared {
    pub mod constants;
    pub mod embedding;
    pub mod frame;
    pub mod image_files;
    pub mod region;
}

pub mod imaging {
    pub mod domain {
        pub mod image_reader;
        pub mod image_writer;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod face_extractor;
    }
    pub mod infrastructure;
}

pub mod gallery {
    pub mod build_gallery_use_case;
    pub mod domain {
        pub mod gallery;
        pub mod gallery_store;
    }
    pub mod infrastructure;
}

pub mod matching {
    pub mod domain {
        pub mod distance;
        pub mod face_matcher;
        pub mod match_result;
    }
    pub mod infrastructure;
}

pub mod classification {
    pub mod classifier_config;
    pub mod domain {
        pub mod aggregator;
        pub mod category;
        pub mod classification_decision;
        pub mod identity;
    }
}

pub mod pipeline {
    pub mod batch_executor;
    pub mod classification_report;
    pub mod classify_images_use_case;
    pub mod output_placer;
    pub mod pipeline_error;
    pub mod pipeline_logger;
    pub mod infrastructure;
}
