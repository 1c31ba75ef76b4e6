pub mod callbacks;
pub mod prepare_env;
