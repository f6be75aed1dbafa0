// 領域層：請求範圍的資料模型與協調器使用的介面

pub mod model;
pub mod ports;
