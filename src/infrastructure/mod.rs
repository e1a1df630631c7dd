// Infrastructure: external concerns (model files)

pub mod lp_writer;
