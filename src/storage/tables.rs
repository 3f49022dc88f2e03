use redb::TableDefinition;

/// Note records: uuid -> NoteRecord (msgpack)
pub const NOTES: TableDefinition<&str, &[u8]> = TableDefinition::new("notes");

/// User records: uuid -> UserRecord (msgpack)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Email index: lowercase email -> user uuid
pub const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");
