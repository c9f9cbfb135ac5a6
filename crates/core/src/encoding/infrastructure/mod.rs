pub mod json_encoding_store;
