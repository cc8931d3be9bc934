pub mod category;
pub mod interval;
pub mod kline;
pub mod series;
pub mod table;
pub mod windows;
