pub mod human_format;
