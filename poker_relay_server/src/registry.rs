//! 房间注册表。
//!
//! 每个房间独占一局 [`Round`]，放在自己的互斥锁里：同一房间的命令串行执行，
//! 不同房间之间互不阻塞。锁不能跨 `.await` 持有。

use crate::error::{validate_name, RelayError};
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::Mutex;
use poker_relay_core::{Round, RoomId, Username};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub struct Room {
    pub id: RoomId,
    pub round: Round,
    // 按入座顺序排列，索引就是玩家在 Round 中的序号
    pub seats: Vec<Username>,
    passphrase: String,
}

impl Room {
    pub fn capacity(&self) -> usize {
        self.round.players().len()
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() == self.capacity()
    }

    /// 用户在本房间的玩家序号
    pub fn seat_of(&self, username: &str) -> Result<usize, RelayError> {
        self.seats
            .iter()
            .position(|u| u == username)
            .ok_or_else(|| RelayError::NotSeated { room: self.id.clone(), user: username.to_string() })
    }

    /// 发牌前所有座位都必须有人
    pub fn require_full(&self) -> Result<(), RelayError> {
        if self.is_full() {
            Ok(())
        } else {
            Err(RelayError::RoomNotReady { room: self.id.clone(), joined: self.seats.len(), needed: self.capacity() })
        }
    }
}

/// 新建房间的信息，终止口令只在这里返回一次
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub id: RoomId,
    pub num_players: usize,
    pub starting_cash: i64,
    pub passphrase: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub id: RoomId,
    pub joined: usize,
    pub num_players: usize,
}

pub type RoomSlot = Arc<Mutex<Room>>;

pub struct Registry {
    rooms: DashMap<RoomId, RoomSlot>,
    // 已占用的房间名额，插入前先预留，保证总数不超过上限
    reserved: AtomicUsize,
    max_rooms: usize,
}

impl Registry {
    pub fn new(max_rooms: usize) -> Registry {
        Registry { rooms: DashMap::new(), reserved: AtomicUsize::new(0), max_rooms }
    }

    pub fn create_room(&self, id: &str, num_players: usize, starting_cash: i64) -> Result<RoomInfo, RelayError> {
        validate_name(id)?;
        // 先构造 Round，参数不合法时不占用房间号
        let round = Round::new(num_players, starting_cash)?;

        match self.rooms.entry(id.to_string()) {
            Entry::Occupied(_) => Err(RelayError::DuplicateRoom(id.to_string())),
            Entry::Vacant(slot) => {
                self.reserved
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < self.max_rooms).then_some(n + 1))
                    .map_err(|_| RelayError::TooManyRooms(self.max_rooms))?;
                let passphrase = Uuid::new_v4().simple().to_string();
                slot.insert(Arc::new(Mutex::new(Room {
                    id: id.to_string(),
                    round,
                    seats: Vec::with_capacity(num_players),
                    passphrase: passphrase.clone(),
                })));
                Ok(RoomInfo { id: id.to_string(), num_players, starting_cash, passphrase })
            }
        }
    }

    pub fn get_room(&self, id: &str) -> Result<RoomSlot, RelayError> {
        self.rooms
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| RelayError::RoomNotFound(id.to_string()))
    }

    /// 所有房间，按房间号排序
    pub fn list_rooms(&self) -> Vec<RoomSummary> {
        let slots: Vec<RoomSlot> = self.rooms.iter().map(|r| r.value().clone()).collect();
        let mut rooms: Vec<RoomSummary> = slots
            .iter()
            .map(|slot| {
                let room = slot.lock();
                RoomSummary { id: room.id.clone(), joined: room.seats.len(), num_players: room.capacity() }
            })
            .collect();
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        rooms
    }

    /// 让用户入座，返回玩家序号。已经入座的用户返回原来的序号
    pub fn add_player(&self, room_id: &str, username: &str) -> Result<usize, RelayError> {
        let slot = self.get_room(room_id)?;
        let mut room = slot.lock();
        if let Ok(idx) = room.seat_of(username) {
            return Ok(idx);
        }
        if room.is_full() {
            return Err(RelayError::RoomFull(room_id.to_string()));
        }
        room.seats.push(username.to_string());
        Ok(room.seats.len() - 1)
    }

    /// 用创建时的口令终止并移除房间
    pub fn terminate_room(&self, room_id: &str, passphrase: &str) -> Result<(), RelayError> {
        let slot = self.get_room(room_id)?;
        if slot.lock().passphrase != passphrase {
            return Err(RelayError::InvalidPassphrase(room_id.to_string()));
        }
        if self.rooms.remove(room_id).is_some() {
            self.reserved.fetch_sub(1, Ordering::AcqRel);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }
}
