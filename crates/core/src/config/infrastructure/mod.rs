pub mod yaml_config_resolver;
