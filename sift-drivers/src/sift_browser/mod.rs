pub mod behavioral;
pub mod cdp;
pub mod driver;
pub mod fingerprint;
pub mod page;
pub mod stealth;
pub mod wait;
