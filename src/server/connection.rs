// Connection handling module
// Serves one accepted TCP connection, optionally behind TLS

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;

use super::ListenerRole;
use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing the connection limit, and serve it in a
/// spawned task
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    role: ListenerRole,
    tls: Option<&TlsAcceptor>,
) {
    // Increment counter first, then check limit
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);
    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            return;
        }
    }

    let state = Arc::clone(state);
    let conn_counter = Arc::clone(conn_counter);
    let tls = tls.cloned();

    tokio::spawn(async move {
        match tls {
            Some(acceptor) => match acceptor.accept(stream).await {
                Ok(tls_stream) => serve_connection(tls_stream, peer_addr, state, role).await,
                Err(e) => logger::log_connection_error(&format!("TLS handshake with {peer_addr}: {e}")),
            },
            None => serve_connection(stream, peer_addr, state, role).await,
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Run HTTP/1.1 on an established stream until the client is done
///
/// `read_timeout` bounds only the wait for a request head; a response body
/// being written is never cut off.
async fn serve_connection<I>(io: I, peer_addr: SocketAddr, state: Arc<AppState>, role: ListenerRole)
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let performance = &state.config.performance;

    let mut builder = http1::Builder::new();
    builder.keep_alive(performance.keep_alive_timeout > 0);
    if performance.read_timeout > 0 {
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(Duration::from_secs(performance.read_timeout));
    }

    let service_state = Arc::clone(&state);
    let conn = builder.serve_connection(
        TokioIo::new(io),
        service_fn(move |req| {
            handler::handle_request(req, Arc::clone(&service_state), role, peer_addr)
        }),
    );

    if let Err(err) = conn.await {
        logger::log_connection_error(&format!("{peer_addr}: {err}"));
    }
}
