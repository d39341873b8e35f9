pub mod result_exporter;
