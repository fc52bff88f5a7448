// OAuth callback listener - receives the consent redirect on the loopback interface

use super::AuthError;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

/// OAuth callback result with code and state
#[derive(Debug)]
pub struct CallbackResult {
    pub code: String,
    pub state: Option<String>,
}

pub struct CallbackListener {
    listener: TcpListener,
    port: u16,
}

impl CallbackListener {
    /// Bind the loopback listener. Port 0 picks a free ephemeral port.
    pub fn bind(port: u16) -> Result<Self, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .map_err(|e| AuthError::Callback(format!("Failed to bind to port {}: {}", port, e)))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::Callback(format!("Failed to read local address: {}", e)))?
            .port();

        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/", self.port)
    }

    /// Block until the browser is redirected back with a code or an error, or the timeout passes
    pub fn wait(self, timeout: Duration) -> Result<CallbackResult, AuthError> {
        self.listener
            .set_nonblocking(true)
            .map_err(|e| AuthError::Callback(format!("Failed to set non-blocking: {}", e)))?;

        let start = Instant::now();

        loop {
            if start.elapsed() > timeout {
                return Err(AuthError::Callback("Timeout waiting for OAuth callback".to_string()));
            }

            match self.listener.accept() {
                Ok((mut stream, _)) => {
                    // Accepted sockets inherit non-blocking mode on some platforms
                    let _ = stream.set_nonblocking(false);
                    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));

                    let mut request_line = String::new();
                    {
                        let mut reader = match stream.try_clone() {
                            Ok(s) => BufReader::new(s),
                            Err(_) => continue,
                        };
                        if reader.read_line(&mut request_line).is_err() {
                            continue;
                        }
                    }

                    if let Some((code, state)) = extract_code_and_state(&request_line) {
                        let _ = stream.write_all(response_page("Signed In", "You can close this window.").as_bytes());
                        let _ = stream.flush();
                        return Ok(CallbackResult { code, state });
                    } else if request_line.contains("error=") {
                        let error = extract_error_from_request(&request_line)
                            .unwrap_or_else(|| "Unknown error".to_string());
                        let _ = stream.write_all(response_page("Sign In Failed", &error).as_bytes());
                        let _ = stream.flush();
                        return Err(AuthError::Callback(error));
                    }
                    // Anything else (favicon requests, port scans) is ignored
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(AuthError::Callback(format!("Accept error: {}", e)));
                }
            }
        }
    }
}

fn response_page(title: &str, message: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html; charset=utf-8\r\n\
        Connection: close\r\n\r\n\
        <!DOCTYPE html>\
        <html><head><meta charset=\"utf-8\"></head><body>\
        <h1>{}</h1><p>{}</p>\
        </body></html>",
        escape_html(title),
        escape_html(message)
    )
}

/// Query values end up in the page body, so markup characters are escaped
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Extract query string from HTTP request line (e.g., "GET /?code=xxx HTTP/1.1")
fn extract_query_string(request: &str) -> Option<&str> {
    let path = request.split_whitespace().nth(1)?;
    let query_start = path.find('?')?;
    Some(&path[query_start + 1..])
}

fn get_query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|param| {
        let (k, v) = param.split_once('=')?;
        if k == key {
            urlencoding::decode(&v.replace('+', " ")).ok().map(|s| s.into_owned())
        } else {
            None
        }
    })
}

fn extract_code_and_state(request: &str) -> Option<(String, Option<String>)> {
    let query = extract_query_string(request)?;
    let code = get_query_param(query, "code")?;
    let state = get_query_param(query, "state");
    Some((code, state))
}

fn extract_error_from_request(request: &str) -> Option<String> {
    let query = extract_query_string(request)?;
    get_query_param(query, "error_description").or_else(|| get_query_param(query, "error"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpStream;

    #[test]
    fn test_extract_code_and_state() {
        let line = "GET /?state=abc123&code=4%2F0AX&scope=https%3A%2F%2Fmail.google.com%2F HTTP/1.1\r\n";
        let (code, state) = extract_code_and_state(line).unwrap();
        assert_eq!(code, "4/0AX");
        assert_eq!(state.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_extract_error() {
        let line = "GET /?error=access_denied HTTP/1.1";
        assert!(extract_code_and_state(line).is_none());
        assert_eq!(extract_error_from_request(line).as_deref(), Some("access_denied"));

        let described = "GET /?error=x&error_description=User+cancelled HTTP/1.1";
        assert_eq!(extract_error_from_request(described).as_deref(), Some("User cancelled"));
    }

    #[test]
    fn test_error_description_is_escaped_in_page() {
        let line = "GET /?error=access_denied&error_description=%3Cscript%3Ealert(1)%3C%2Fscript%3E+%26 HTTP/1.1";
        let description = extract_error_from_request(line).unwrap();
        let page = response_page("Authorization failed", &description);

        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp;"));
    }

    #[test]
    fn test_request_without_query() {
        assert!(extract_code_and_state("GET /favicon.ico HTTP/1.1").is_none());
    }

    #[test]
    fn test_listener_receives_code() {
        let listener = CallbackListener::bind(0).unwrap();
        let port = listener.port();
        assert_ne!(port, 0);
        assert_eq!(listener.redirect_uri(), format!("http://localhost:{}/", port));

        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
            stream
                .write_all(b"GET /?code=granted&state=s1 HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .unwrap();
            let mut response = String::new();
            let _ = stream.read_to_string(&mut response);
            response
        });

        let result = listener.wait(Duration::from_secs(10)).unwrap();
        assert_eq!(result.code, "granted");
        assert_eq!(result.state.as_deref(), Some("s1"));

        let response = client.join().unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"));
    }

    #[test]
    fn test_listener_times_out() {
        let listener = CallbackListener::bind(0).unwrap();
        let err = listener.wait(Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, AuthError::Callback(_)));
    }
}
