//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Bazaar Configuration
# Only override what you want to change -- missing fields use defaults.

[server]
# bind = "0.0.0.0"
# port = 8080
# ws_path = "/ws"          # live stats socket path
# outbound_buffer = 32     # 1-1024, queued stats per client

[presence]
# counting = "per_connect" # per_connect | unique_address
# stats_page = "home"      # page whose views are broadcast
# pages = ["home", "item", "categories"]  # pages clients may report views for

[logging]
# filter = "bazaar_server=info,bazaar_presence=info,bazaar_config=info"
"##
    .to_string()
}
