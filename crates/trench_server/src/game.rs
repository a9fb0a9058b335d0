//! # Game Server
//!
//! Match rules on top of the world: who may do what, and who hears about it.
//!
//! ## Flow
//!
//! ```text
//! datagram ─▶ handle_datagram ─▶ decode (serverbound)
//!                 ├─ unknown address + ExistingPlayer ─▶ join
//!                 └─ known player ─▶ sender check ─▶ handler ─▶ outbox
//!
//! tick(dt) ─▶ world.update ─▶ world events (falls, blasts) ─▶ damage
//!          ─▶ respawns, timeouts ─▶ position/orientation broadcast
//!
//! flush(sink) ─▶ encode each packet once ─▶ one datagram per recipient
//! ```
//!
//! The client is trusted for its own movement within a tolerance, and for
//! nothing else: every hit, throw and block edit is checked here first.

use std::collections::HashMap;
use std::net::SocketAddr;

use trench_core::{Vec3, VoxelCoord, VoxelMap};
use trench_protocol::{
    BlockAction, ChangeTeam, ChangeWeapon, ChatMessage, CtfState, Direction, ExistingPlayer,
    GrenadePacket, HitPacket, InputData, IntelState, KillAction, MapChunk, MapStart, ModeState,
    OrientationData, Packet, PacketRegistry, PlayerLeft, PositionData, Rgb, SetHp, SetTool,
    StateData,
};
use trench_world::{
    emit_detonation, emit_fall, BlastHit, BodyPart, CharacterSpawn, GrenadeSpawn,
    KinematicKernel, ObjectId, World, WorldEvent,
};

use crate::config::ServerConfig;
use crate::player::{Player, PlayerTable, MAX_HP, SPECTATOR};
use crate::transport::{PacketSink, MAX_DATAGRAM_SIZE};

/// Map bytes per [`MapChunk`]. The packet id byte brings a full chunk to
/// exactly [`MAX_DATAGRAM_SIZE`].
pub const MAP_CHUNK_SIZE: usize = MAX_DATAGRAM_SIZE - 1;

/// Longest display name kept (characters).
pub const MAX_NAME_LEN: usize = 15;

/// Furthest a melee hit may land (units).
const MELEE_REACH: f32 = 3.0;

/// Recipients of a queued packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// One player.
    Player(u8),
    /// Everyone.
    All,
    /// Everyone but one player.
    AllExcept(u8),
    /// One team.
    Team(i8),
}

/// Authoritative match state.
pub struct GameServer {
    config: ServerConfig,
    registry: PacketRegistry,
    world: World,
    players: PlayerTable,
    grenade_owners: HashMap<ObjectId, u8>,
    map_data: Vec<u8>,
    ctf: CtfState,
    tick: u64,
    outbox: Vec<(Target, Packet)>,
}

impl GameServer {
    /// Creates an empty match. `map_data` is streamed verbatim to joiners.
    #[must_use]
    pub fn new(config: ServerConfig, map_data: Vec<u8>) -> Self {
        let map = &config.map;
        let world = World::with_map(
            Box::new(KinematicKernel::default()),
            Box::new(VoxelMap::flat(map.width, map.length, map.depth, map.ground_z)),
        );
        let gameplay = &config.gameplay;
        let ctf = CtfState {
            cap_limit: gameplay.cap_limit,
            team1_intel: IntelState::Dropped {
                position: gameplay.team1_spawn,
            },
            team2_intel: IntelState::Dropped {
                position: gameplay.team2_spawn,
            },
            team1_base: gameplay.team1_spawn,
            team2_base: gameplay.team2_spawn,
            ..CtfState::default()
        };
        let players = PlayerTable::new(config.server.max_players);
        tracing::info!(
            world = %world.id(),
            slots = players.capacity(),
            map_bytes = map_data.len(),
            "game server ready"
        );
        Self {
            config,
            registry: PacketRegistry::for_direction(Direction::Serverbound),
            world,
            players,
            grenade_owners: HashMap::new(),
            map_data,
            ctf,
            tick: 0,
            outbox: Vec::new(),
        }
    }

    /// The simulation.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Joined players.
    #[must_use]
    pub const fn players(&self) -> &PlayerTable {
        &self.players
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Packets queued since the last flush.
    #[must_use]
    pub fn pending(&self) -> &[(Target, Packet)] {
        &self.outbox
    }

    // ------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------

    /// Handles one datagram. Malformed or unauthorised traffic is logged and
    /// dropped.
    pub fn handle_datagram(&mut self, addr: SocketAddr, data: &[u8]) {
        let packet = match self.registry.decode(data) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!(%addr, error = %e, "malformed datagram dropped");
                return;
            }
        };

        let Some(id) = self.players.by_addr(addr) else {
            match packet {
                Packet::ExistingPlayer(join) => self.join(addr, join),
                other => tracing::debug!(%addr, packet = other.name(), "packet before join ignored"),
            }
            return;
        };

        if let Some(player) = self.players.get_mut(id) {
            player.last_seen = self.tick;
        }
        if let Some(claimed) = claimed_player(&packet) {
            if claimed != id {
                tracing::warn!(player = id, claimed, packet = packet.name(), "spoofed player id");
                return;
            }
        }
        self.handle_packet(id, packet);
    }

    fn handle_packet(&mut self, id: u8, packet: Packet) {
        match packet {
            Packet::Position(p) => self.on_position(id, p.position),
            Packet::Orientation(o) => self.on_orientation(id, o.orientation),
            Packet::Input(input) => self.on_input(id, input),
            Packet::Hit(hit) => self.on_hit(id, hit),
            Packet::Grenade(grenade) => self.on_grenade(id, grenade),
            Packet::SetTool(set) => {
                if let Some(player) = self.players.get_mut(id) {
                    player.tool = set.tool;
                }
                self.send(Target::AllExcept(id), set);
            }
            Packet::SetColor(set) => {
                if let Some(player) = self.players.get_mut(id) {
                    player.color = set.color & 0x00FF_FFFF;
                }
                self.send(Target::AllExcept(id), set);
            }
            Packet::BlockAction(action) => self.on_block(id, action),
            Packet::ChatMessage(chat) => self.on_chat(id, chat),
            Packet::WeaponReload(reload) => {
                if self.is_alive(id) {
                    self.send(Target::AllExcept(id), reload);
                }
            }
            Packet::ChangeTeam(change) => self.on_change_team(id, change.team),
            Packet::ChangeWeapon(change) => self.on_change_weapon(id, change.weapon),
            Packet::ExistingPlayer(_) => tracing::debug!(player = id, "already joined"),
            other => tracing::debug!(player = id, packet = other.name(), "unhandled packet"),
        }
    }

    fn join(&mut self, addr: SocketAddr, join: ExistingPlayer) {
        let Some(id) = self.players.free_id() else {
            tracing::warn!(%addr, "server full, join refused");
            return;
        };

        let team = if (SPECTATOR..=1).contains(&join.team) {
            join.team
        } else {
            0
        };
        let name = display_name(&join.name, id);
        let spawn = self.spawn_point(team);
        let character = self.world.create_object(CharacterSpawn {
            on_fall: Some(emit_fall()),
            ..CharacterSpawn::new(spawn)
        });
        let player = Player {
            id,
            addr,
            name,
            team,
            weapon: join.weapon,
            tool: join.tool,
            color: join.color & 0x00FF_FFFF,
            kills: 0,
            hp: MAX_HP,
            character,
            last_seen: self.tick,
            respawn_at: None,
        };
        tracing::info!(player = id, %addr, name = %player.name, team, "player joined");

        self.send(
            Target::Player(id),
            MapStart {
                size: u32::try_from(self.map_data.len()).unwrap_or(u32::MAX),
            },
        );
        let chunks: Vec<MapChunk> = self
            .map_data
            .chunks(MAP_CHUNK_SIZE)
            .map(|chunk| MapChunk {
                data: chunk.to_vec(),
            })
            .collect();
        for chunk in chunks {
            self.send(Target::Player(id), chunk);
        }
        let [r, g, b] = self.config.gameplay.fog_color;
        self.send(
            Target::Player(id),
            StateData {
                player_id: id,
                fog_color: Rgb::new(r, g, b),
                state: ModeState::Ctf(self.ctf),
            },
        );
        let existing: Vec<ExistingPlayer> = self.players.iter().map(Player::existing).collect();
        for other in existing {
            self.send(Target::Player(id), other);
        }

        let create = player.create(spawn);
        self.players.insert(player);
        self.send(Target::All, create);
    }

    fn on_position(&mut self, id: u8, position: Vec3) {
        if !self.is_alive(id) || !is_finite(position) {
            return;
        }
        let tolerance = self.config.gameplay.position_tolerance;
        let Some(object) = self.players.get(id).map(|p| p.character) else {
            return;
        };
        let Some(character) = self.world.objects_mut().character_mut(object) else {
            return;
        };
        let current = character.position();
        if current.distance_squared(position) <= tolerance * tolerance {
            character.set_position(position.x, position.y, position.z, false);
        } else {
            tracing::debug!(player = id, ?position, ?current, "position rejected");
            self.send(
                Target::Player(id),
                PositionData {
                    player_id: id,
                    position: current,
                },
            );
        }
    }

    fn on_orientation(&mut self, id: u8, orientation: Vec3) {
        if !self.is_alive(id) || !is_finite(orientation) {
            return;
        }
        let Some(object) = self.players.get(id).map(|p| p.character) else {
            return;
        };
        let parts = self.world.parts();
        if let Some(character) = parts.objects.character_mut(object) {
            character.set_orientation(parts.kernel, orientation.x, orientation.y, orientation.z);
        }
    }

    fn on_input(&mut self, id: u8, input: InputData) {
        if !self.is_alive(id) {
            return;
        }
        let Some(object) = self.players.get(id).map(|p| p.character) else {
            return;
        };
        let flags = input.flags;
        let parts = self.world.parts();
        let Some(character) = parts.objects.character_mut(object) else {
            return;
        };

        // Standing up needs headroom
        let crouch = if character.inputs().crouch && !flags.crouch {
            parts
                .map
                .is_some_and(|map| !character.can_uncrouch(&*parts.kernel, map))
        } else {
            flags.crouch
        };
        character.set_walk(flags.up, flags.down, flags.left, flags.right);
        character.set_animation(flags.jump, crouch, false, false);
        character.set_fire(flags.fire, flags.aim);

        self.send(Target::AllExcept(id), input);
    }

    fn on_hit(&mut self, shooter: u8, hit: HitPacket) {
        let victim = hit.player_id;
        let (Some(s), Some(v)) = (self.players.get(shooter), self.players.get(victim)) else {
            tracing::debug!(player = shooter, victim, "hit on unknown player");
            return;
        };
        if shooter == victim || !s.is_alive() || !v.is_alive() {
            return;
        }
        if v.team == SPECTATOR || s.team == SPECTATOR || s.team == v.team {
            return;
        }
        let Some(part) = BodyPart::from_tag(hit.value) else {
            tracing::warn!(player = shooter, tag = hit.value, "hit on unknown body part");
            return;
        };
        let (shooter_obj, victim_obj) = (s.character, v.character);

        let objects = self.world.objects();
        let (Some(a), Some(b)) = (objects.character(shooter_obj), objects.character(victim_obj))
        else {
            return;
        };
        let gameplay = &self.config.gameplay;
        let valid = a.validate_hit(
            self.world.kernel(),
            b,
            hit.value,
            gameplay.aim_tolerance,
            gameplay.dist_tolerance,
        );
        let in_reach = part != BodyPart::Melee
            || a.position().distance_squared(b.position()) <= MELEE_REACH * MELEE_REACH;
        if !valid || !in_reach {
            tracing::debug!(player = shooter, victim, ?part, "hit rejected");
            return;
        }
        let source = a.position();

        let (damage, kill_type) = match part {
            BodyPart::Head => (100, KillAction::HEADSHOT),
            BodyPart::Torso => (49, KillAction::WEAPON),
            BodyPart::Arms | BodyPart::Legs => (33, KillAction::WEAPON),
            BodyPart::Melee => (80, KillAction::MELEE),
        };
        self.damage(victim, damage, source, shooter, kill_type);
    }

    fn on_grenade(&mut self, id: u8, grenade: GrenadePacket) {
        if !self.is_alive(id)
            || !grenade.fuse.is_finite()
            || !is_finite(grenade.position)
            || !is_finite(grenade.velocity)
        {
            return;
        }
        let gameplay = &self.config.gameplay;
        let tolerance = gameplay.position_tolerance;
        let fuse = grenade.fuse.clamp(0.0, gameplay.max_grenade_fuse);
        let Some(thrower) = self.character_position(id) else {
            return;
        };
        if thrower.distance_squared(grenade.position) > tolerance * tolerance {
            tracing::warn!(player = id, position = ?grenade.position, "grenade thrown from afar");
            return;
        }

        let object = self.world.create_object(GrenadeSpawn {
            on_detonate: Some(emit_detonation()),
            ..GrenadeSpawn::new(grenade.position, grenade.velocity, fuse)
        });
        self.grenade_owners.insert(object, id);
        tracing::debug!(player = id, object = %object, fuse, "grenade thrown");
        self.send(Target::AllExcept(id), GrenadePacket { fuse, ..grenade });
    }

    #[allow(clippy::cast_precision_loss)]
    fn on_block(&mut self, id: u8, action: BlockAction) {
        let Some(player) = self.players.get(id) else {
            return;
        };
        let tool_ok = match action.value {
            BlockAction::BUILD => player.tool == SetTool::BLOCK,
            BlockAction::DESTROY => player.tool == SetTool::SPADE || player.tool == SetTool::WEAPON,
            BlockAction::SPADE_SECONDARY => player.tool == SetTool::SPADE,
            _ => false,
        };
        if !player.is_alive() || !tool_ok {
            tracing::debug!(player = id, value = action.value, tool = player.tool, "block action refused");
            return;
        }
        let Some(eye) = self.character_position(id) else {
            return;
        };
        let [x, y, z] = action.position;
        let center = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, z as f32 + 0.5);
        let reach = self.config.gameplay.build_reach;
        if !self.in_bounds(action.position) || eye.distance_squared(center) > reach * reach {
            tracing::debug!(player = id, position = ?action.position, "block action out of reach");
            return;
        }

        let Some(map) = self.world.map_mut() else {
            return;
        };
        match action.value {
            BlockAction::BUILD => map.set_solid(x, y, z, true),
            BlockAction::DESTROY => map.set_solid(x, y, z, false),
            _ => {
                for dz in -1..=1 {
                    map.set_solid(x, y, z + dz, false);
                }
            }
        }
        self.send(Target::All, BlockAction { player_id: id, ..action });
    }

    fn on_chat(&mut self, id: u8, chat: ChatMessage) {
        let Some(team) = self.players.get(id).map(|p| p.team) else {
            return;
        };
        let target = match chat.chat_type {
            ChatMessage::ALL => Target::All,
            ChatMessage::TEAM => Target::Team(team),
            other => {
                tracing::warn!(player = id, chat_type = other, "chat channel refused");
                return;
            }
        };
        tracing::info!(player = id, channel = chat.chat_type, message = %chat.value, "chat");
        self.send(target, chat);
    }

    fn on_change_team(&mut self, id: u8, team: i8) {
        if !(SPECTATOR..=1).contains(&team) {
            tracing::warn!(player = id, team, "invalid team");
            return;
        }
        let Some(player) = self.players.get_mut(id) else {
            return;
        };
        if player.team == team {
            return;
        }
        player.team = team;
        let alive = player.is_alive();
        tracing::info!(player = id, team, "team changed");
        self.send(Target::All, ChangeTeam { player_id: id, team });
        if alive {
            self.kill(id, id, KillAction::TEAM_CHANGE);
        }
    }

    fn on_change_weapon(&mut self, id: u8, weapon: u8) {
        let Some(player) = self.players.get_mut(id) else {
            return;
        };
        if player.weapon == weapon {
            return;
        }
        player.weapon = weapon;
        let alive = player.is_alive();
        self.send(Target::All, ChangeWeapon { player_id: id, weapon });
        if alive {
            self.kill(id, id, KillAction::CLASS_CHANGE);
        }
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Runs one simulation step of `dt` seconds and queues its broadcasts.
    pub fn tick(&mut self, dt: f32) {
        self.tick += 1;
        self.world.update(dt);

        let events: Vec<WorldEvent> = self.world.drain_events().collect();
        for event in events {
            match event {
                WorldEvent::Fell { object, magnitude } => self.on_fall(object, magnitude),
                WorldEvent::Detonated {
                    grenade,
                    position,
                    hits,
                } => self.on_detonation(grenade, position, &hits),
            }
        }

        self.respawn_due();
        self.drop_silent(dt);
        self.broadcast_movement();
    }

    fn on_fall(&mut self, object: ObjectId, magnitude: f32) {
        let Some(id) = self.players.by_character(object) else {
            return;
        };
        let damage = to_damage(magnitude * self.config.gameplay.fall_damage_scale);
        if damage == 0 {
            return;
        }
        let source = self.character_position(id).unwrap_or(Vec3::ZERO);
        tracing::debug!(player = id, magnitude, damage, "fall damage");
        self.apply_damage(id, damage, source, true, id, KillAction::FALL);
    }

    fn on_detonation(&mut self, grenade: ObjectId, position: Vec3, hits: &[BlastHit]) {
        let thrower = self
            .grenade_owners
            .remove(&grenade)
            .filter(|id| self.players.get(*id).is_some());
        let thrower_team = thrower.and_then(|id| self.players.get(id)).map(|p| p.team);

        for hit in hits {
            let Some(victim) = self.players.by_character(hit.object) else {
                continue;
            };
            let Some(team) = self.players.get(victim).map(|p| p.team) else {
                continue;
            };
            if team == SPECTATOR || (thrower != Some(victim) && thrower_team == Some(team)) {
                continue;
            }
            let killer = thrower.unwrap_or(victim);
            self.damage(victim, to_damage(hit.damage), position, killer, KillAction::GRENADE);
        }

        let Some(thrower) = thrower else {
            return;
        };
        let [x, y, z] = position.voxel();
        if let Some(map) = self.world.map_mut() {
            for dz in -1..=1 {
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        map.set_solid(x + dx, y + dy, z + dz, false);
                    }
                }
            }
        }
        self.send(
            Target::All,
            BlockAction {
                player_id: thrower,
                position: [x, y, z],
                value: BlockAction::GRENADE,
            },
        );
    }

    fn respawn_due(&mut self) {
        let due: Vec<u8> = self
            .players
            .iter()
            .filter(|p| p.respawn_at.is_some_and(|at| at <= self.tick))
            .map(|p| p.id)
            .collect();

        for id in due {
            let Some(player) = self.players.get_mut(id) else {
                continue;
            };
            player.respawn_at = None;
            player.hp = MAX_HP;
            let (team, object) = (player.team, player.character);
            let spawn = self.spawn_point(team);
            if let Some(character) = self.world.objects_mut().character_mut(object) {
                character.set_position(spawn.x, spawn.y, spawn.z, true);
                character.set_dead(false);
            }
            if let Some(create) = self.players.get(id).map(|p| p.create(spawn)) {
                tracing::debug!(player = id, "respawned");
                self.send(Target::All, create);
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn drop_silent(&mut self, dt: f32) {
        let timeout_ticks = (self.config.server.client_timeout_secs / dt.max(f32::EPSILON)) as u64;
        let silent: Vec<u8> = self
            .players
            .iter()
            .filter(|p| self.tick.saturating_sub(p.last_seen) > timeout_ticks)
            .map(|p| p.id)
            .collect();
        for id in silent {
            tracing::info!(player = id, "player timed out");
            self.disconnect(id);
        }
    }

    fn broadcast_movement(&mut self) {
        let moving: Vec<(u8, Vec3, Vec3)> = self
            .players
            .iter()
            .filter(|p| p.is_alive())
            .filter_map(|p| {
                let c = self.world.objects().character(p.character)?;
                Some((p.id, c.position(), c.orientation()))
            })
            .collect();

        for (player_id, position, orientation) in moving {
            self.send(Target::AllExcept(player_id), PositionData { player_id, position });
            self.send(
                Target::AllExcept(player_id),
                OrientationData {
                    player_id,
                    orientation,
                },
            );
        }
    }

    /// Removes a player and its body, and tells everyone else.
    pub fn disconnect(&mut self, id: u8) {
        let Some(player) = self.players.remove(id) else {
            return;
        };
        self.world.delete(player.character);
        self.grenade_owners.retain(|_, owner| *owner != id);
        tracing::info!(player = id, addr = %player.addr, "player left");
        self.send(Target::All, PlayerLeft { player_id: id });
    }

    // ------------------------------------------------------------------
    // Damage
    // ------------------------------------------------------------------

    fn damage(&mut self, victim: u8, amount: u8, source: Vec3, killer: u8, kill_type: u8) {
        self.apply_damage(victim, amount, source, false, killer, kill_type);
    }

    fn apply_damage(
        &mut self,
        victim: u8,
        amount: u8,
        source: Vec3,
        fall: bool,
        killer: u8,
        kill_type: u8,
    ) {
        let Some(player) = self.players.get_mut(victim) else {
            return;
        };
        if !player.is_alive() {
            return;
        }
        player.hp = player.hp.saturating_sub(amount);
        let hp = player.hp;
        self.send(Target::Player(victim), SetHp { hp, fall, source });
        if hp == 0 {
            self.kill(victim, killer, kill_type);
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn kill(&mut self, victim: u8, killer: u8, kill_type: u8) {
        let respawn_ticks =
            (self.config.gameplay.respawn_secs * self.config.server.tick_rate as f32) as u64;
        let Some(player) = self.players.get_mut(victim) else {
            return;
        };
        player.hp = 0;
        player.respawn_at = Some(self.tick + respawn_ticks.max(1));
        let object = player.character;
        if let Some(character) = self.world.objects_mut().character_mut(object) {
            character.set_dead(true);
        }
        if killer != victim {
            if let Some(killer) = self.players.get_mut(killer) {
                killer.kills += 1;
            }
        }
        tracing::info!(victim, killer, kill_type, "player killed");
        self.send(
            Target::All,
            KillAction {
                player_id: victim,
                killer_id: killer,
                kill_type,
            },
        );
    }

    // ------------------------------------------------------------------
    // Outbound
    // ------------------------------------------------------------------

    fn send(&mut self, target: Target, packet: impl Into<Packet>) {
        self.outbox.push((target, packet.into()));
    }

    /// Encodes every queued packet and hands one copy per recipient to
    /// `sink`.
    pub fn flush(&mut self, sink: &mut dyn PacketSink) {
        let outbox = std::mem::take(&mut self.outbox);
        for (target, packet) in outbox {
            let bytes = match packet.to_bytes() {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(packet = packet.name(), error = %e, "packet not encodable");
                    continue;
                }
            };
            for addr in self.recipients(target) {
                sink.send(addr, bytes.clone());
            }
        }
    }

    fn recipients(&self, target: Target) -> Vec<SocketAddr> {
        self.players
            .iter()
            .filter(|p| match target {
                Target::Player(id) => p.id == id,
                Target::All => true,
                Target::AllExcept(id) => p.id != id,
                Target::Team(team) => p.team == team,
            })
            .map(|p| p.addr)
            .collect()
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn is_alive(&self, id: u8) -> bool {
        self.players.get(id).is_some_and(Player::is_alive)
    }

    fn character_position(&self, id: u8) -> Option<Vec3> {
        let object = self.players.get(id)?.character;
        self.world.objects().character(object).map(|c| c.position())
    }

    fn spawn_point(&self, team: i8) -> Vec3 {
        if team == 1 {
            self.config.gameplay.team2_spawn
        } else {
            self.config.gameplay.team1_spawn
        }
    }

    fn in_bounds(&self, [x, y, z]: VoxelCoord) -> bool {
        let map = &self.config.map;
        (0..map.width).contains(&x) && (0..map.length).contains(&y) && (0..map.depth).contains(&z)
    }
}

impl std::fmt::Debug for GameServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameServer")
            .field("tick", &self.tick)
            .field("players", &self.players.len())
            .field("world", &self.world)
            .field("pending", &self.outbox.len())
            .finish_non_exhaustive()
    }
}

/// Player id a packet claims to come from, for packets that carry one.
fn claimed_player(packet: &Packet) -> Option<u8> {
    match packet {
        Packet::Position(p) => Some(p.player_id),
        Packet::Orientation(p) => Some(p.player_id),
        Packet::Input(p) => Some(p.player_id),
        Packet::Grenade(p) => Some(p.player_id),
        Packet::SetTool(p) => Some(p.player_id),
        Packet::SetColor(p) => Some(p.player_id),
        Packet::BlockAction(p) => Some(p.player_id),
        Packet::ChatMessage(p) => Some(p.player_id),
        Packet::WeaponReload(p) => Some(p.player_id),
        Packet::ChangeTeam(p) => Some(p.player_id),
        Packet::ChangeWeapon(p) => Some(p.player_id),
        _ => None,
    }
}

fn display_name(requested: &str, id: u8) -> String {
    let name: String = requested
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_LEN)
        .collect();
    if name.is_empty() {
        format!("Player{id}")
    } else {
        name
    }
}

fn is_finite(v: Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_damage(amount: f32) -> u8 {
    amount.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use trench_protocol::SetColor;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("  deuce  ", 3), "deuce");
        assert_eq!(display_name("", 3), "Player3");
        assert_eq!(display_name("\u{7}", 4), "Player4");
        assert_eq!(display_name("abcdefghijklmnopqrstuvwxyz", 0).len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_to_damage_clamps() {
        assert_eq!(to_damage(-3.0), 0);
        assert_eq!(to_damage(48.6), 49);
        assert_eq!(to_damage(1.0e6), 255);
    }

    #[test]
    fn test_claimed_player() {
        let packet = Packet::from(SetColor {
            player_id: 7,
            color: 0,
        });
        assert_eq!(claimed_player(&packet), Some(7));
        let hit = Packet::from(HitPacket {
            player_id: 2,
            value: 0,
        });
        assert_eq!(claimed_player(&hit), None, "a hit names its victim");
    }
}
