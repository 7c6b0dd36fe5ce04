// ==========================================
// 订单履约管理台 - API 层
// ==========================================
// 职责: 面向外层（数据加载/渲染）的业务接口
// 红线: 不拥有线格式、文件格式或 CLI，仅为进程内计算库的门面
// ==========================================

pub mod projection_api;

pub use projection_api::ProjectionApi;
