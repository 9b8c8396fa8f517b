use std::net::IpAddr;
use std::str::FromStr;

use config::{Config, ConfigError, Environment, File};
use ipnet::IpNet;
use serde::Deserialize;

/// Postmark's published inbound webhook source addresses, plus localhost.
const DEFAULT_IP_WHITE_LIST: [&str; 7] = [
    "50.31.156.104",
    "50.31.156.105",
    "50.31.156.106",
    "50.31.156.107",
    "50.31.156.108",
    "50.31.156.6",
    "127.0.0.1",
];

/// Immutable runtime configuration, built once at startup from defaults,
/// an optional TOML file and `POSTMARK_INBOUND_*` environment variables.
#[derive(Debug, Deserialize)]
pub struct Settings {
    webhook: Webhook,
    database: Option<Database>,
    attachment_upload_to: String,
    save_mail_to_db: bool,
    encode_attachments: bool,
    ip_white_list: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Webhook {
    listen_address: String,
}

#[derive(Debug, Deserialize)]
struct Database {
    r#type: String,
    user: String,
    pass: String,
    host: String,
    port: u16,
    db_name: String,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("webhook.listen_address", "0.0.0.0:8000")?
            .set_default("attachment_upload_to", "attachments")?
            .set_default("save_mail_to_db", true)?
            .set_default("encode_attachments", false)?
            .set_default("ip_white_list", DEFAULT_IP_WHITE_LIST.map(String::from).to_vec())?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("POSTMARK_INBOUND").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn get_db_url(&self) -> Option<String> {
        self.database.as_ref().map(|database| {
            format!(
                "{}://{}:{}@{}:{}/{}",
                database.r#type,
                database.user,
                database.pass,
                database.host,
                database.port,
                database.db_name,
            )
        })
    }

    pub fn get_listen_address(&self) -> &String {
        &self.webhook.listen_address
    }

    pub fn attachment_upload_to(&self) -> &str {
        &self.attachment_upload_to
    }

    pub fn save_mail_to_db(&self) -> bool {
        self.save_mail_to_db
    }

    pub fn encode_attachments(&self) -> bool {
        self.encode_attachments
    }

    /// Allow-list entries parsed as CIDR ranges; a bare address counts as a
    /// host-sized network.
    pub fn get_allowed_networks(&self) -> Vec<IpNet> {
        self.ip_white_list
            .iter()
            .map(|entry| {
                IpNet::from_str(entry)
                    .or_else(|_| IpAddr::from_str(entry).map(IpNet::from))
                    .expect("Unable to parse allow-list entry")
            })
            .collect()
    }

    pub fn allows(&self, caller: IpAddr) -> bool {
        self.get_allowed_networks()
            .iter()
            .any(|network| network.contains(&caller))
    }
}
