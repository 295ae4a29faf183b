//! Session bookkeeping and packet dispatch for the world loop.

mod combat;
mod login;
mod movement;
mod npc;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use ff_rs_game::player::SessionId;
use ff_rs_game::scheduler::TimerRegistry;
use ff_rs_game::world::{World, WorldEvent};
use ff_rs_proto::packets::{ClientPacket, ServerPacket};

use crate::config::ServerConfig;
use crate::net::NetEvent;
use crate::persistence::{unix_timestamp, PlayerStore};

/// Transport-side state of one client.
struct Connection {
    addr: SocketAddr,
    outbound: UnboundedSender<Bytes>,
}

pub struct ConnectionHandler {
    world: World,
    timers: TimerRegistry,
    connections: HashMap<SessionId, Connection>,
    /// Sessions to close once their queued packets are flushed.
    pending_close: Vec<SessionId>,
    store: Box<dyn PlayerStore + Send>,
    config: Arc<ServerConfig>,
    started: Instant,
    next_autosave: u64,
}

impl ConnectionHandler {
    pub fn new(world: World, store: Box<dyn PlayerStore + Send>, config: Arc<ServerConfig>) -> Self {
        let timers = TimerRegistry::with_intervals(
            config.timers.mob_step_ms,
            config.timers.player_tick_ms,
            config.timers.buff_sweep_ms,
        );
        let next_autosave = config.world.autosave_interval * 1000;
        Self {
            world,
            timers,
            connections: HashMap::new(),
            pending_close: Vec::new(),
            store,
            config,
            started: Instant::now(),
            next_autosave,
        }
    }

    /// Milliseconds since the handler was created; the world's clock.
    pub fn now(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn player_count(&self) -> usize {
        self.world.player_count()
    }

    pub fn handle_event(&mut self, event: NetEvent, now: u64) {
        match event {
            NetEvent::Connected {
                session,
                addr,
                outbound,
            } => {
                debug!("{session} attached from {addr}");
                self.connections
                    .insert(session, Connection { addr, outbound });
            }
            NetEvent::Packet {
                session,
                packet_type,
                payload,
            } => self.handle_packet(session, packet_type, &payload, now),
            NetEvent::Disconnected { session } => self.handle_disconnect(session),
        }
        self.flush();
    }

    fn handle_packet(&mut self, session: SessionId, packet_type: u32, payload: &[u8], now: u64) {
        if !self.connections.contains_key(&session) {
            return;
        }
        let packet = match ClientPacket::decode(packet_type, payload) {
            Ok(p) => p,
            Err(e) => {
                warn!("Bad packet {packet_type:#010x} from {session}: {e}");
                return;
            }
        };

        // Only entering is allowed before the session owns a player.
        if !matches!(packet, ClientPacket::PcEnter(_)) && self.world.player(session).is_none() {
            debug!("{session} sent {packet_type:#010x} before entering");
            return;
        }

        match packet {
            ClientPacket::PcEnter(req) => self.handle_enter(session, req, now),
            ClientPacket::PcLoadingComplete(req) => self.handle_loading_complete(session, req),
            ClientPacket::PcExit(req) => self.handle_exit(session, req),
            ClientPacket::LiveCheck(_) => self.handle_live_check(session, now),
            ClientPacket::PcRegen(req) => self.handle_regen(session, req),
            ClientPacket::PcMove(req) => self.handle_move(session, req),
            ClientPacket::PcStop(req) => self.handle_stop(session, req),
            ClientPacket::PcAttackNpcs(req) => self.handle_attack_npcs(session, req, now),
            ClientPacket::PcCombatBegin(_) => self.handle_combat_toggle(session, true),
            ClientPacket::PcCombatEnd(_) => self.handle_combat_toggle(session, false),
            ClientPacket::DotDamageOnOff(req) => self.handle_dot_damage(session, req),
            ClientPacket::NpcSummon(req) => self.handle_npc_summon(session, req),
            ClientPacket::NpcUnsummon(req) => self.handle_npc_unsummon(session, req),
            ClientPacket::ShinyPickup(req) => self.handle_shiny_pickup(session, req, now),
            ClientPacket::PcWarpUseNpc(req) => self.handle_warp_use_npc(session, req),
        }
    }

    /// Run due periodic jobs, report world events and autosave.
    pub fn tick(&mut self, now: u64) {
        for kind in self.timers.poll(now) {
            self.world.run_timer(kind, now);
        }
        self.process_world_events();

        let interval = self.config.world.autosave_interval * 1000;
        if interval > 0 && now >= self.next_autosave {
            self.next_autosave = now + interval;
            let saved = self.save_all();
            info!("Auto-saved {saved} players");
        }
        self.flush();
    }

    fn process_world_events(&mut self) {
        for event in self.world.drain_events() {
            match event {
                WorldEvent::MobKilled { killer, npc_type } => {
                    let pc_id = self.world.player(killer).map_or(0, |p| p.id);
                    debug!("Player {pc_id} killed a mob of type {npc_type}");
                }
            }
        }
    }

    /// Write every queued packet to its socket, then close sessions that
    /// were kicked.
    pub fn flush(&mut self) {
        for envelope in self.world.outbox.drain() {
            self.send_packet(envelope.to, &envelope.packet);
        }
        for session in std::mem::take(&mut self.pending_close) {
            if let Some(conn) = self.connections.remove(&session) {
                debug!("Closing {session} ({})", conn.addr);
            }
        }
    }

    fn send_packet(&mut self, session: SessionId, packet: &ServerPacket) {
        let Some(conn) = self.connections.get(&session) else {
            return;
        };
        let frame = match packet.to_frame() {
            Ok(f) => f,
            Err(e) => {
                error!(
                    "Failed to encode packet {:#010x} for {session}: {e}",
                    packet.packet_id()
                );
                return;
            }
        };
        if conn.outbound.send(frame).is_err() {
            debug!("{session} is gone, dropping packet {:#010x}", packet.packet_id());
        }
    }

    /// Save a connected player's record.
    fn save_player(&self, session: SessionId) {
        let Some(player) = self.world.player(session) else {
            return;
        };
        let record = player.to_record(unix_timestamp());
        if let Err(e) = self.store.save(&record) {
            warn!("Failed to save player {}: {e}", record.id);
        }
    }

    /// Save every connected player. Returns how many were written out.
    pub fn save_all(&self) -> usize {
        let sessions: Vec<SessionId> = self.world.players.keys().copied().collect();
        for session in &sessions {
            self.save_player(*session);
        }
        sessions.len()
    }

    /// Save and remove a player, then close their connection after the next
    /// flush.
    fn kick(&mut self, session: SessionId) {
        self.save_player(session);
        if let Some(player) = self.world.remove_player(session) {
            info!(
                "{} ({}) left ({} online)",
                player.name,
                player.id,
                self.world.player_count()
            );
        }
        self.pending_close.push(session);
    }

    fn handle_disconnect(&mut self, session: SessionId) {
        self.connections.remove(&session);
        if self.world.player(session).is_some() {
            self.kick(session);
        }
    }
}

/// Wall-clock milliseconds, sent to clients as server time.
fn server_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
