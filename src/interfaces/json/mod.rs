pub mod status_writer;
