use std::io;
use std::net::{IpAddr, ToSocketAddrs};

/// The replica machines of a bucket, split into "this host" and the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Machines {
    local: bool,
    remotes: Vec<String>,
}

impl Machines {
    /// `remotes` are copy destinations such as `user@host`.
    pub fn new(local: bool, remotes: Vec<String>) -> Self {
        Self { local, remotes }
    }

    /// Classify configured addresses as local or remote. Remote entries are
    /// prefixed with `user@` when a copy user is set.
    pub fn resolve(addrs: &[String], user: Option<&str>) -> io::Result<Self> {
        let host_name = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_default();
        let host_addrs = resolve_host(&host_name);

        let mut machines = Machines::default();
        for addr in addrs {
            if is_local(addr, &host_name, &host_addrs)? {
                machines.local = true;
            } else {
                let remote = match user {
                    Some(user) if !user.is_empty() => format!("{user}@{addr}"),
                    _ => addr.clone(),
                };
                machines.remotes.push(remote);
            }
        }
        Ok(machines)
    }

    /// Whether this host is one of the machines.
    pub fn has_local(&self) -> bool {
        self.local
    }

    pub fn remotes(&self) -> &[String] {
        &self.remotes
    }
}

fn resolve_host(host_name: &str) -> Vec<IpAddr> {
    if host_name.is_empty() {
        return Vec::new();
    }
    (host_name, 0)
        .to_socket_addrs()
        .map(|addrs| addrs.map(|a| a.ip()).collect())
        .unwrap_or_default()
}

fn is_local(addr: &str, host_name: &str, host_addrs: &[IpAddr]) -> io::Result<bool> {
    let host = addr.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost")
        || (!host_name.is_empty() && host.eq_ignore_ascii_case(host_name))
    {
        return Ok(true);
    }

    for resolved in (host, 0).to_socket_addrs()? {
        let ip = resolved.ip();
        if ip.is_loopback() || ip.is_unspecified() || host_addrs.contains(&ip) {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_addresses_are_local() {
        let addrs = vec!["127.0.0.1".to_string(), "localhost".to_string(), "::1".to_string()];
        let machines = Machines::resolve(&addrs, Some("deploy")).unwrap();
        assert!(machines.has_local());
        assert!(machines.remotes().is_empty());
    }

    #[test]
    fn test_remote_addresses_get_user_prefix() {
        // TEST-NET-1 addresses never belong to this host.
        let addrs = vec!["127.0.0.1".to_string(), "192.0.2.10".to_string()];
        let machines = Machines::resolve(&addrs, Some("deploy")).unwrap();
        assert!(machines.has_local());
        assert_eq!(machines.remotes(), ["deploy@192.0.2.10".to_string()]);

        let machines = Machines::resolve(&addrs[1..], None).unwrap();
        assert!(!machines.has_local());
        assert_eq!(machines.remotes(), ["192.0.2.10".to_string()]);
    }
}
