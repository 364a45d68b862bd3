use crate::models::*;
use crate::services::{CampaignService, DrawService};
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/campaigns/{id}/draw",
    tag = "draw",
    params(("id" = i64, Path, description = "活动ID (必须已激活)")),
    responses(
        (status = 200, description = "抽奖成功; exhausted=true 表示活动已无可发奖项", body = DrawResponse),
        (status = 404, description = "活动不存在或未激活"),
        (status = 409, description = "并发冲突重试耗尽, 可稍后再试")
    )
)]
/// 进行一次抽奖:
/// 1. 序列有未消费项 -> 按序列给出赢家并推进游标 (CAS, 冲突自动重试)
/// 2. 序列耗尽/为空 -> 两级随机回退 (带金额未满配额 -> 安慰奖)
/// 3. 全部不可用 -> exhausted (正常业务结果, 非错误)
/// 转盘/单骰子返回 1 条 pick, 三骰子返回 3 条 (每个骰子独立选取)
pub async fn draw(service: web::Data<DrawService>, path: web::Path<i64>) -> Result<HttpResponse> {
    match service.draw(path.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/campaigns/{id}/reset",
    tag = "draw",
    params(("id" = i64, Path, description = "活动ID")),
    responses(
        (status = 200, description = "重置成功: 记录清空 / 计数归零 / 序列重建"),
        (status = 404, description = "活动不存在或未激活")
    )
)]
/// 重置活动 (管理操作): 删除全部抽奖记录, 计数清零, 重建序列。
/// 与抽奖共用事务边界, 不会与进行中的抽奖交错。
pub async fn reset(service: web::Data<DrawService>, path: web::Path<i64>) -> Result<HttpResponse> {
    match service.reset(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "success": true }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/campaigns/{id}/results",
    tag = "draw",
    params(
        ("id" = i64, Path, description = "活动ID"),
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    responses(
        (status = 200, description = "获取抽奖记录成功", body = PaginatedResponse<DrawResultResponse>),
        (status = 404, description = "活动不存在")
    )
)]
/// 分页获取活动抽奖记录 (倒序), 只读
pub async fn get_results(
    service: web::Data<CampaignService>,
    path: web::Path<i64>,
    query: web::Query<DrawResultQuery>,
) -> Result<HttpResponse> {
    match service
        .list_results(path.into_inner(), &query.into_inner())
        .await
    {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn draw_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/campaigns/{id}/draw", web::post().to(draw))
        .route("/campaigns/{id}/reset", web::post().to(reset))
        .route("/campaigns/{id}/results", web::get().to(get_results));
}
