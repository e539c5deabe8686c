pub mod hash;
pub mod icon_path;
pub mod jwt;
