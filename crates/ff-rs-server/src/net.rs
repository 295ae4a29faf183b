//! TCP transport: length-prefixed frames in, framed packets out.
//!
//! Every connection gets a reader task that forwards decoded frames to the
//! world loop and a writer task fed by an unbounded channel, so queuing a
//! packet never blocks the simulation.

use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use ff_rs_game::player::SessionId;
use ff_rs_proto::codec::{decode_frame_header, FRAME_HEADER_SIZE};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};

/// Transport notifications consumed by the world loop.
#[derive(Debug)]
pub enum NetEvent {
    Connected {
        session: SessionId,
        addr: SocketAddr,
        outbound: UnboundedSender<Bytes>,
    },
    Packet {
        session: SessionId,
        packet_type: u32,
        payload: Bytes,
    },
    Disconnected {
        session: SessionId,
    },
}

/// Read one frame. `Ok(None)` means the peer closed cleanly between frames.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> std::io::Result<Option<(u32, Bytes)>> {
    let mut header = [0u8; FRAME_HEADER_SIZE];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let (len, packet_type) = decode_frame_header(header)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let mut payload = BytesMut::zeroed(len);
    reader.read_exact(&mut payload).await?;
    Ok(Some((packet_type, payload.freeze())))
}

/// Bind `addr` and serve connections until the listener fails.
pub async fn listen(addr: SocketAddr, events: UnboundedSender<NetEvent>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {addr}");
    serve(listener, events).await
}

pub async fn serve(listener: TcpListener, events: UnboundedSender<NetEvent>) -> std::io::Result<()> {
    let mut next_session = 1u64;
    loop {
        let (stream, addr) = listener.accept().await?;
        let session = SessionId(next_session);
        next_session += 1;
        debug!("{session} connected from {addr}");
        tokio::spawn(handle_connection(stream, addr, session, events.clone()));
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    session: SessionId,
    events: UnboundedSender<NetEvent>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("{session}: set_nodelay failed: {e}");
    }
    let (mut reader, mut writer) = stream.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();

    if events
        .send(NetEvent::Connected {
            session,
            addr,
            outbound: tx,
        })
        .is_err()
    {
        return;
    }

    // Ends when the world loop drops the sender or the socket fails.
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if writer.write_all(&frame).await.is_err() {
                break;
            }
        }
        let _ = writer.shutdown().await;
    });

    loop {
        tokio::select! {
            frame = read_frame(&mut reader) => match frame {
                Ok(Some((packet_type, payload))) => {
                    let event = NetEvent::Packet { session, packet_type, payload };
                    if events.send(event).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("{session} ({addr}): {e}");
                    break;
                }
            },
            _ = &mut send_task => break,
        }
    }

    send_task.abort();
    let _ = events.send(NetEvent::Disconnected { session });
    debug!("{session} disconnected");
}
