pub mod encoding_store;
