pub mod json_result_exporter;
