//! Web server command.

use console::style;

use crate::config::Settings;

/// Port used when the bind address names only a host.
const DEFAULT_PORT: u16 = 8000;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;

    if let Err(e) = settings.require_credentials() {
        eprintln!("{} {}", style("✗").red(), e);
        return Err(e.into());
    }

    println!(
        "{} Starting invoice API at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!(
        "  Uploads: {} (max {} bytes)",
        settings.allowed_extensions.join(", "),
        settings.max_upload_bytes
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "8000" -> 127.0.0.1:8000
/// - Just a host: "0.0.0.0" -> 0.0.0.0:8000
/// - Host and port: "0.0.0.0:8000" -> 0.0.0.0:8000
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    let bind = bind.trim();
    if bind.is_empty() {
        anyhow::bail!("Empty bind address");
    }

    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    Ok((bind.to_string(), DEFAULT_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_only() {
        assert_eq!(
            parse_bind_address("9000").unwrap(),
            ("127.0.0.1".to_string(), 9000)
        );
    }

    #[test]
    fn test_parse_host_only() {
        assert_eq!(
            parse_bind_address("0.0.0.0").unwrap(),
            ("0.0.0.0".to_string(), 8000)
        );
    }

    #[test]
    fn test_parse_host_and_port() {
        assert_eq!(
            parse_bind_address("127.0.0.1:8000").unwrap(),
            ("127.0.0.1".to_string(), 8000)
        );
        assert_eq!(
            parse_bind_address("localhost:3000").unwrap(),
            ("localhost".to_string(), 3000)
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_bind_address("  ").is_err());
    }

    #[tokio::test]
    async fn test_serve_refuses_without_credentials() {
        let settings = Settings::default();
        assert!(cmd_serve(&settings, "127.0.0.1:0").await.is_err());
    }
}
