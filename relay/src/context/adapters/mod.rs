pub mod in_memory;
pub mod redis;

pub use in_memory::InMemoryContextBackend;
pub use redis::RedisContextBackend;
