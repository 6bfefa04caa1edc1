//! Well-known `port → service name` table.
//!
//! The same table doubles as the port list of a quick scan
//! ([`TargetSet::common_ports`](crate::targets::TargetSet::common_ports)).

/// Sorted by port so lookups can binary search.
pub static COMMON_PORTS: &[(u16, &str)] = &[
    (20, "FTP Data"),
    (21, "FTP Control"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (80, "HTTP"),
    (110, "POP3"),
    (111, "RPC"),
    (135, "MSRPC"),
    (139, "NetBIOS"),
    (143, "IMAP"),
    (443, "HTTPS"),
    (445, "SMB"),
    (465, "SMTPS"),
    (587, "SMTP Submission"),
    (993, "IMAPS"),
    (995, "POP3S"),
    (1433, "MS SQL Server"),
    (1521, "Oracle DB"),
    (3306, "MySQL"),
    (3389, "RDP"),
    (5432, "PostgreSQL"),
    (5900, "VNC"),
    (6379, "Redis"),
    (8080, "HTTP Proxy"),
    (8443, "HTTPS Alt"),
    (9090, "Web Admin"),
    (27017, "MongoDB"),
];

/// Returns the well-known service name for `port`, if any.
pub fn service_name(port: u16) -> Option<&'static str> {
    COMMON_PORTS
        .binary_search_by_key(&port, |(p, _)| *p)
        .ok()
        .map(|idx| COMMON_PORTS[idx].1)
}

/// Iterates the ports of the well-known table in ascending order.
pub fn common_ports() -> impl Iterator<Item = u16> {
    COMMON_PORTS.iter().map(|(port, _)| *port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_services_table_is_sorted_and_unique() {
        assert!(COMMON_PORTS.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(COMMON_PORTS.len(), 29);
    }

    #[test]
    fn test_services_lookup() {
        assert_eq!(service_name(22), Some("SSH"));
        assert_eq!(service_name(27017), Some("MongoDB"));
        assert_eq!(service_name(20), Some("FTP Data"));
        assert_eq!(service_name(2222), None);
    }
}
