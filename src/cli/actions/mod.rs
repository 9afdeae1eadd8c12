pub mod server;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        otp_webhook_url: Option<String>,
        otp_ttl: u64,
    },
}
