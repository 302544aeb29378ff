//! Blocking IMAP lookup and deletion of probe messages
//!
//! Runs on the blocking pool. Each call opens a fresh session and logs out
//! before returning, whatever the outcome.

use crate::{
    client::{probe_subject, subject_matches},
    error::{AppError, Result},
    models::{ProbeEndpoint, ServerSettings},
};
use mailparse::MailHeaderMap;
use native_tls::TlsConnector;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Open the INBOX of `owner`, find the probe from `expected_from` carrying
/// `correlation_id`, and delete the first confirmed match
pub fn delete_matching(
    owner: &ProbeEndpoint,
    expected_from: &str,
    correlation_id: &str,
    io_timeout: Duration,
) -> Result<bool> {
    let server = &owner.mailbox;
    let stream = connect_tcp(server, io_timeout)?;

    // Mailboxes are configured for implicit TLS or plaintext only
    if server.security.is_encrypted() {
        let tls = TlsConnector::builder().build()?;
        let stream = tls
            .connect(&server.host, stream)
            .map_err(|e| AppError::imap(format!("TLS handshake with {} failed: {}", server.host, e)))?;
        run_session(imap::Client::new(stream), owner, expected_from, correlation_id)
    } else {
        run_session(imap::Client::new(stream), owner, expected_from, correlation_id)
    }
}

fn connect_tcp(server: &ServerSettings, io_timeout: Duration) -> Result<TcpStream> {
    let addr = (server.host.as_str(), server.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| AppError::imap(format!("Could not resolve IMAP server {}", server.host)))?;

    let stream = TcpStream::connect_timeout(&addr, io_timeout)?;
    stream.set_read_timeout(Some(io_timeout))?;
    stream.set_write_timeout(Some(io_timeout))?;
    Ok(stream)
}

fn run_session<T: Read + Write>(
    mut client: imap::Client<T>,
    owner: &ProbeEndpoint,
    expected_from: &str,
    correlation_id: &str,
) -> Result<bool> {
    client.read_greeting()?;
    let mut session = client
        .login(&owner.address, owner.credential.expose())
        .map_err(|(e, _)| AppError::imap(format!("Login as {} failed: {}", owner.address, e)))?;

    let result = find_and_delete(&mut session, expected_from, correlation_id);

    if let Err(e) = session.logout() {
        tracing::debug!(mailbox = %owner.address, "IMAP logout failed: {}", e);
    }

    result
}

fn find_and_delete<T: Read + Write>(
    session: &mut imap::Session<T>,
    expected_from: &str,
    correlation_id: &str,
) -> Result<bool> {
    session.select("INBOX")?;

    let mut hits: Vec<u32> = session.search(search_query(expected_from, correlation_id))?.into_iter().collect();
    hits.sort_unstable();

    for seq in hits {
        let fetches = session.fetch(seq.to_string(), "RFC822.HEADER")?;
        let confirmed = fetches
            .iter()
            .filter_map(|fetch| fetch.header())
            .any(|header| header_subject_matches(header, correlation_id));

        if confirmed {
            session.store(seq.to_string(), "+FLAGS (\\Deleted)")?;
            session.expunge()?;
            return Ok(true);
        }

        tracing::debug!(seq, correlation_id, "Search hit does not carry the exact identifier");
    }

    Ok(false)
}

/// IMAP SEARCH criteria for a probe from `expected_from`
pub fn search_query(expected_from: &str, correlation_id: &str) -> String {
    format!(
        "FROM {} SUBJECT {}",
        quote(expected_from),
        quote(&probe_subject(correlation_id))
    )
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Decode the Subject header of a raw header block and check the identifier
pub fn header_subject_matches(raw_headers: &[u8], correlation_id: &str) -> bool {
    match mailparse::parse_headers(raw_headers) {
        Ok((headers, _)) => headers
            .get_first_value("Subject")
            .map(|subject| subject_matches(&subject, correlation_id))
            .unwrap_or(false),
        Err(e) => {
            tracing::debug!("Unparseable message headers: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::tests::endpoint;
    use crate::types::Side;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    /// Stream replaying canned server output and recording what the client writes
    struct ScriptedServer {
        replies: Cursor<Vec<u8>>,
        written: Arc<Mutex<Vec<u8>>>,
    }

    impl ScriptedServer {
        fn new(replies: String) -> (Self, Arc<Mutex<Vec<u8>>>) {
            let written = Arc::new(Mutex::new(Vec::new()));
            let server = Self {
                replies: Cursor::new(replies.into_bytes()),
                written: written.clone(),
            };
            (server, written)
        }
    }

    impl Read for ScriptedServer {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.replies.read(buf)
        }
    }

    impl Write for ScriptedServer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn header_fetch(tag: &str, seq: u32, subject: &str) -> String {
        let headers = format!("From: a@int\r\nSubject: {}\r\n\r\n", subject);
        format!(
            "* {} FETCH (RFC822.HEADER {{{}}}\r\n{})\r\n{} OK FETCH completed\r\n",
            seq,
            headers.len(),
            headers,
            tag
        )
    }

    fn commands(written: &Arc<Mutex<Vec<u8>>>) -> Vec<String> {
        String::from_utf8(written.lock().unwrap().clone())
            .unwrap()
            .split("\r\n")
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_session_skips_unconfirmed_hit_and_deletes_match() {
        let replies = [
            "* OK IMAP ready\r\n".to_string(),
            "a1 OK LOGIN completed\r\n".to_string(),
            "* 2 EXISTS\r\n* 0 RECENT\r\na2 OK [READ-WRITE] SELECT completed\r\n".to_string(),
            "* SEARCH 2 1\r\na3 OK SEARCH completed\r\n".to_string(),
            header_fetch("a4", 1, "Mail Health Exporter - abc1234"),
            header_fetch("a5", 2, "Mail Health Exporter - abc123"),
            "* 2 FETCH (FLAGS (\\Deleted))\r\na6 OK STORE completed\r\n".to_string(),
            "* 2 EXPUNGE\r\na7 OK EXPUNGE completed\r\n".to_string(),
            "* BYE logging out\r\na8 OK LOGOUT completed\r\n".to_string(),
        ]
        .concat();
        let (server, written) = ScriptedServer::new(replies);
        let owner = endpoint(Side::External, "b@ext");

        let deleted = run_session(imap::Client::new(server), &owner, "a@int", "abc123").unwrap();

        assert!(deleted);
        assert_eq!(
            commands(&written),
            vec![
                "a1 LOGIN \"b@ext\" \"secret\"",
                "a2 SELECT \"INBOX\"",
                "a3 SEARCH FROM \"a@int\" SUBJECT \"Mail Health Exporter - abc123\"",
                "a4 FETCH 1 RFC822.HEADER",
                "a5 FETCH 2 RFC822.HEADER",
                "a6 STORE 2 +FLAGS (\\Deleted)",
                "a7 EXPUNGE",
                "a8 LOGOUT",
            ]
        );
    }

    #[test]
    fn test_session_without_confirmed_hit_deletes_nothing() {
        let replies = [
            "* OK IMAP ready\r\n".to_string(),
            "a1 OK LOGIN completed\r\n".to_string(),
            "* 1 EXISTS\r\na2 OK SELECT completed\r\n".to_string(),
            "* SEARCH 1\r\na3 OK SEARCH completed\r\n".to_string(),
            header_fetch("a4", 1, "Re: something else"),
            "a5 OK LOGOUT completed\r\n".to_string(),
        ]
        .concat();
        let (server, written) = ScriptedServer::new(replies);
        let owner = endpoint(Side::Internal, "a@int");

        let deleted = run_session(imap::Client::new(server), &owner, "b@ext", "abc123").unwrap();

        assert!(!deleted);
        let sent = commands(&written);
        assert_eq!(sent.last().map(String::as_str), Some("a5 LOGOUT"));
        assert!(sent.iter().all(|line| !line.contains("STORE") && !line.contains("EXPUNGE")));
    }

    #[test]
    fn test_session_with_no_search_hits() {
        let replies = [
            "* OK IMAP ready\r\n",
            "a1 OK LOGIN completed\r\n",
            "* 0 EXISTS\r\na2 OK SELECT completed\r\n",
            "* SEARCH\r\na3 OK SEARCH completed\r\n",
            "a4 OK LOGOUT completed\r\n",
        ]
        .concat();
        let (server, written) = ScriptedServer::new(replies);
        let owner = endpoint(Side::Internal, "a@int");

        assert!(!run_session(imap::Client::new(server), &owner, "b@ext", "abc123").unwrap());
        assert_eq!(commands(&written).len(), 4);
    }

    #[test]
    fn test_rejected_login_is_an_imap_error() {
        let replies = "* OK IMAP ready\r\na1 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n".to_string();
        let (server, written) = ScriptedServer::new(replies);
        let owner = endpoint(Side::External, "b@ext");

        let err = run_session(imap::Client::new(server), &owner, "a@int", "abc123").unwrap_err();

        assert!(matches!(err, AppError::Imap(_)));
        assert!(err.to_string().contains("b@ext"));
        assert_eq!(commands(&written).len(), 1);
    }

    #[test]
    fn test_search_query() {
        assert_eq!(
            search_query("a@int", "abc123"),
            "FROM \"a@int\" SUBJECT \"Mail Health Exporter - abc123\""
        );
        assert_eq!(search_query("we\"ird@int", "x"), "FROM \"we\\\"ird@int\" SUBJECT \"Mail Health Exporter - x\"");
    }

    #[test]
    fn test_header_subject_matches_plain() {
        let raw = b"From: a@int\r\nSubject: Mail Health Exporter - abc123\r\n\r\n";
        assert!(header_subject_matches(raw, "abc123"));
        assert!(!header_subject_matches(raw, "abc12"));
        assert!(!header_subject_matches(raw, "zzz999"));
    }

    #[test]
    fn test_header_subject_matches_encoded_word() {
        // "Mail Health Exporter - abc123" as a base64 encoded word
        let raw = b"Subject: =?utf-8?B?TWFpbCBIZWFsdGggRXhwb3J0ZXIgLSBhYmMxMjM=?=\r\n\r\n";
        assert!(header_subject_matches(raw, "abc123"));
    }

    #[test]
    fn test_header_without_subject() {
        assert!(!header_subject_matches(b"From: a@int\r\n\r\n", "abc123"));
    }
}
