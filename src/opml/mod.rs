pub mod opml_catalog;
