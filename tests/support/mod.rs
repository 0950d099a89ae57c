use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use owngate::codec::own_password;

// -----------------------------------------------------------------------------
// ----- Constants -------------------------------------------------------------

pub const ACK: &str = "*#*1##";
pub const NACK: &str = "*#*0##";

pub const MAC_REPLY: &str = "*#13**12*0*26*34*12*21*1##";
pub const MODEL_REPLY: &str = "*#13**15*11##";
pub const FIRMWARE_REPLY: &str = "*#13**16*3*0*1##";

/// What the handshake replies above decode to on the client side.
#[allow(dead_code)]
pub const EXPECTED_MAC: &str = "00:1a:22:0c:15:01";
#[allow(dead_code)]
pub const EXPECTED_MODEL: &str = "MHServer2";
#[allow(dead_code)]
pub const EXPECTED_FIRMWARE: &str = "3.0.1";

// -----------------------------------------------------------------------------
// ----- Behavior knobs --------------------------------------------------------

#[derive(Clone, Copy, Debug)]
pub enum Auth {
    Open,
    Password { nonce: &'static str, password: u32 },
}

#[derive(Clone, Copy, Debug)]
pub enum AckPolicy {
    Ack,
    AckAfter(Duration),
    Nack,
    Silent,
}

enum Ctrl {
    Push(String),
    CloseConnection,
}

// -----------------------------------------------------------------------------
// ----- FakeGateway -----------------------------------------------------------

/// In-process OpenWebNet gateway double. Accepts connections sequentially
/// (so reconnect scenarios work), performs the greeting/auth/identity
/// handshake, then answers commands per the configured policy and forwards
/// every received command frame to the test.
pub struct FakeGateway {
    pub addr: SocketAddr,
    ctrl: mpsc::UnboundedSender<Ctrl>,
    pub commands: mpsc::UnboundedReceiver<String>,
}

impl FakeGateway {
    pub async fn spawn(auth: Auth, policy: AckPolicy) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake gateway");
        let addr = listener.local_addr().unwrap();

        let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        tokio::spawn(serve(listener, auth, policy, ctrl_rx, commands_tx));

        Self {
            addr,
            ctrl: ctrl_tx,
            commands: commands_rx,
        }
    }

    /// Emit an unsolicited frame (or garbage) to the connected client.
    #[allow(dead_code)]
    pub fn push(&self, frame: &str) {
        let _ = self.ctrl.send(Ctrl::Push(frame.to_string()));
    }

    /// Drop the current connection, simulating transport failure.
    #[allow(dead_code)]
    pub fn kill_connection(&self) {
        let _ = self.ctrl.send(Ctrl::CloseConnection);
    }
}

/// Bind-then-drop an ephemeral port so tests get an address nothing listens on.
#[allow(dead_code)]
pub fn unreachable_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().unwrap().port()
}

// -----------------------------------------------------------------------------
// ----- Server ----------------------------------------------------------------

async fn serve(
    listener: TcpListener,
    auth: Auth,
    policy: AckPolicy,
    mut ctrl: mpsc::UnboundedReceiver<Ctrl>,
    commands: mpsc::UnboundedSender<String>,
) {
    loop {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };

        let mut conn = Conn::new(stream);
        if !handshake(&mut conn, auth).await {
            continue;
        }

        serve_connection(&mut conn, policy, &mut ctrl, &commands).await;
    }
}

async fn handshake(conn: &mut Conn, auth: Auth) -> bool {
    if conn.write(ACK).await.is_err() {
        return false;
    }

    match conn.read_frame().await {
        Some(frame) if frame == "*99*1##" => {}
        _ => return false,
    }

    match auth {
        Auth::Open => {
            if conn.write(ACK).await.is_err() {
                return false;
            }
        }
        Auth::Password { nonce, password } => {
            if conn.write(&format!("*#{nonce}##")).await.is_err() {
                return false;
            }

            let Some(reply) = conn.read_frame().await else {
                return false;
            };
            let expected = format!("*#{}##", own_password(password, nonce));
            let verdict = if reply == expected { ACK } else { NACK };
            if conn.write(verdict).await.is_err() || verdict == NACK {
                return false;
            }
        }
    }

    // Identity queries arrive in a fixed order but are answered by shape.
    for _ in 0..3 {
        let Some(frame) = conn.read_frame().await else {
            return false;
        };
        let reply = match frame.as_str() {
            "*#13**12##" => MAC_REPLY,
            "*#13**15##" => MODEL_REPLY,
            "*#13**16##" => FIRMWARE_REPLY,
            _ => return false,
        };
        if conn.write(reply).await.is_err() || conn.write(ACK).await.is_err() {
            return false;
        }
    }

    true
}

async fn serve_connection(
    conn: &mut Conn,
    policy: AckPolicy,
    ctrl: &mut mpsc::UnboundedReceiver<Ctrl>,
    commands: &mpsc::UnboundedSender<String>,
) {
    loop {
        tokio::select! {
            ctrl_msg = ctrl.recv() => match ctrl_msg {
                Some(Ctrl::Push(frame)) => {
                    if conn.write(&frame).await.is_err() {
                        return;
                    }
                }
                Some(Ctrl::CloseConnection) | None => return,
            },

            frame = conn.read_frame() => {
                let Some(frame) = frame else {
                    return;
                };
                let _ = commands.send(frame);

                match policy {
                    AckPolicy::Ack => {
                        if conn.write(ACK).await.is_err() {
                            return;
                        }
                    }
                    AckPolicy::AckAfter(delay) => {
                        tokio::time::sleep(delay).await;
                        if conn.write(ACK).await.is_err() {
                            return;
                        }
                    }
                    AckPolicy::Nack => {
                        if conn.write(NACK).await.is_err() {
                            return;
                        }
                    }
                    AckPolicy::Silent => {}
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Conn ------------------------------------------------------------------

struct Conn {
    stream: TcpStream,
    buffer: String,
}

impl Conn {
    fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            buffer: String::new(),
        }
    }

    async fn write(&mut self, frame: &str) -> std::io::Result<()> {
        self.stream.write_all(frame.as_bytes()).await
    }

    async fn read_frame(&mut self) -> Option<String> {
        loop {
            if let Some(end) = self.buffer.find("##") {
                let frame: String = self.buffer.drain(..end + 2).collect();
                return Some(frame);
            }

            let mut chunk = [0u8; 1024];
            let n = self.stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            self.buffer.push_str(&String::from_utf8_lossy(&chunk[..n]));
        }
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
