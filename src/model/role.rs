#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Dispatcher = 2,
    Crew = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Dispatcher),
            3 => Some(Role::Crew),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}
