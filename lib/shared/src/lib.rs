pub mod beatmap;
pub mod relocation;
pub mod scan;
