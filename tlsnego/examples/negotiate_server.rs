//! A server which negotiates with each client that connects, prints what
//! was agreed, and hangs up.
//!
//! Usage: cargo run --example negotiate_server [port] [cert.der key.der]
//!
//! Without a certificate only suites that do not sign their key exchange can
//! be negotiated.  With one, the cipher suites are restricted to those the
//! key can sign for.
//!
//! Note that `unwrap()` is used to deal with networking errors; this is not
//! something that is sensible outside of example code.

use std::env;
use std::error::Error as StdError;
use std::fs;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use pki_types::{CertificateDer, PrivateKeyDer};
use tlsnego::{
    sign, CipherSuite, ServerConfig, ServerConnection, SignatureAlgorithm, DEFAULT_CIPHER_SUITES,
};

fn make_config(
    cert_file: Option<String>,
    key_file: Option<String>,
) -> Result<ServerConfig, Box<dyn StdError>> {
    let (cert_file, key_file) = match (cert_file, key_file) {
        (Some(cert), Some(key)) => (cert, key),
        _ => {
            let suites = DEFAULT_CIPHER_SUITES
                .iter()
                .copied()
                .filter(|cs| cs.ecdhe_sign_algorithm().is_none())
                .collect::<Vec<CipherSuite>>();
            return Ok(ServerConfig::builder()
                .with_cipher_suites(&suites)
                .build()?);
        }
    };

    let cert = CertificateDer::from(fs::read(cert_file)?);
    let key = PrivateKeyDer::try_from(fs::read(key_file)?)?;
    // ECDHE_ECDSA suites are signed with EdDSA keys too.
    let algorithm = match sign::any_supported_type(&key)?.algorithm() {
        SignatureAlgorithm::ED25519 => SignatureAlgorithm::ECDSA,
        alg => alg,
    };

    let suites = DEFAULT_CIPHER_SUITES
        .iter()
        .copied()
        .filter(|cs| match cs.ecdhe_sign_algorithm() {
            Some(alg) => alg == algorithm,
            None => true,
        })
        .collect::<Vec<CipherSuite>>();

    Ok(ServerConfig::builder()
        .with_cipher_suites(&suites)
        .with_single_cert(vec![cert], key)
        .build()?)
}

fn serve(config: Arc<ServerConfig>, mut sock: TcpStream) -> Result<(), Box<dyn StdError>> {
    let peer = sock.peer_addr()?;
    let mut conn = ServerConnection::new(config)?;

    while conn.wants_read() {
        if conn.read_tls(&mut sock)? == 0 {
            println!("{}: closed by client", peer);
            return Ok(());
        }

        let result = conn.process_new_packets();
        while conn.wants_write() {
            conn.write_tls(&mut sock)?;
        }

        if let Err(err) = result {
            println!("{}: handshake failed: {}", peer, err);
            return Ok(());
        }
    }

    match conn.session_record() {
        Some(record) => println!(
            "{}: negotiated {:?} {:?} {:?} {:?}",
            peer, record.version, record.cipher_suite, record.compression, record.named_group
        ),
        None => println!("{}: no session", peer),
    }

    conn.send_close_notify();
    while conn.wants_write() {
        conn.write_tls(&mut sock)?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn StdError>> {
    env_logger::init();

    let mut args = env::args();
    args.next();
    let port = args
        .next()
        .map(|p| p.parse::<u16>())
        .transpose()?
        .unwrap_or(4443);
    let config = Arc::new(make_config(args.next(), args.next())?);

    let listener = TcpListener::bind(("::", port))?;
    println!("listening on {}", listener.local_addr()?);

    for sock in listener.incoming() {
        let sock = sock?;
        let config = Arc::clone(&config);
        thread::spawn(move || {
            if let Err(err) = serve(config, sock) {
                println!("connection error: {}", err);
            }
        });
    }

    Ok(())
}
