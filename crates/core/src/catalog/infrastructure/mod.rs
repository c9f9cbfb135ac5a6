pub mod json_asset_source;
