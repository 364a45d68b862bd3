use crate::models::*;
use crate::services::CampaignService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/campaigns",
    tag = "campaign",
    request_body = CreateCampaignRequest,
    responses(
        (status = 200, description = "创建活动成功", body = CampaignDetailResponse),
        (status = 400, description = "配置非法 (带金额无配额 / slot 越界 / 展示位置冲突等)")
    )
)]
/// 创建抽奖活动 (可带初始奖项), 创建时即生成 rotation sequence
pub async fn create_campaign(
    service: web::Data<CampaignService>,
    body: web::Json<CreateCampaignRequest>,
) -> Result<HttpResponse> {
    match service.create_campaign(&body.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/campaigns",
    tag = "campaign",
    responses(
        (status = 200, description = "获取活动列表成功", body = [CampaignResponse])
    )
)]
/// 获取全部活动 (倒序)
pub async fn list_campaigns(service: web::Data<CampaignService>) -> Result<HttpResponse> {
    match service.list_campaigns().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/campaigns/{id}",
    tag = "campaign",
    params(("id" = i64, Path, description = "活动ID")),
    responses(
        (status = 200, description = "获取活动详情成功", body = CampaignDetailResponse),
        (status = 404, description = "活动不存在")
    )
)]
/// 获取活动详情 (含奖项列表与各 slot 序列消费进度)
pub async fn get_campaign(
    service: web::Data<CampaignService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.get_campaign(path.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/campaigns/{id}/activate",
    tag = "campaign",
    params(("id" = i64, Path, description = "活动ID")),
    responses(
        (status = 200, description = "激活成功 (同类型其它活动自动取消激活)", body = CampaignResponse),
        (status = 400, description = "配置不完整: 存在未配置奖项的 slot"),
        (status = 404, description = "活动不存在")
    )
)]
/// 激活活动; 同一游戏类型同时只有一个激活活动
pub async fn activate_campaign(
    service: web::Data<CampaignService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.activate_campaign(path.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/campaigns/{id}",
    tag = "campaign",
    params(("id" = i64, Path, description = "活动ID")),
    responses(
        (status = 200, description = "删除成功 (活动/奖项/序列/记录一并删除)"),
        (status = 404, description = "活动不存在")
    )
)]
/// 删除活动及其全部关联数据
pub async fn delete_campaign(
    service: web::Data<CampaignService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.delete_campaign(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "success": true }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/campaigns/{id}/outcomes",
    tag = "campaign",
    params(("id" = i64, Path, description = "活动ID")),
    request_body = CreateOutcomeRequest,
    responses(
        (status = 200, description = "新增奖项成功 (序列已重建)", body = OutcomeResponse),
        (status = 400, description = "配置非法"),
        (status = 404, description = "活动不存在")
    )
)]
/// 新增奖项; 奖项集变更必然触发序列重建
pub async fn add_outcome(
    service: web::Data<CampaignService>,
    path: web::Path<i64>,
    body: web::Json<CreateOutcomeRequest>,
) -> Result<HttpResponse> {
    match service
        .add_outcome(path.into_inner(), &body.into_inner())
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/campaigns/{id}/outcomes/{outcome_id}",
    tag = "campaign",
    params(
        ("id" = i64, Path, description = "活动ID"),
        ("outcome_id" = i64, Path, description = "奖项ID")
    ),
    request_body = UpdateOutcomeRequest,
    responses(
        (status = 200, description = "修改奖项成功 (序列已重建)", body = OutcomeResponse),
        (status = 400, description = "配置非法"),
        (status = 404, description = "活动或奖项不存在")
    )
)]
/// 修改奖项 (名称 / 金额 / 配额 / 展示位置)
pub async fn update_outcome(
    service: web::Data<CampaignService>,
    path: web::Path<(i64, i64)>,
    body: web::Json<UpdateOutcomeRequest>,
) -> Result<HttpResponse> {
    let (campaign_id, outcome_id) = path.into_inner();
    match service
        .update_outcome(campaign_id, outcome_id, &body.into_inner())
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/campaigns/{id}/outcomes/{outcome_id}",
    tag = "campaign",
    params(
        ("id" = i64, Path, description = "活动ID"),
        ("outcome_id" = i64, Path, description = "奖项ID")
    ),
    responses(
        (status = 200, description = "删除奖项成功 (序列已重建)"),
        (status = 404, description = "活动或奖项不存在")
    )
)]
/// 删除奖项
pub async fn remove_outcome(
    service: web::Data<CampaignService>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let (campaign_id, outcome_id) = path.into_inner();
    match service.remove_outcome(campaign_id, outcome_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "success": true }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/campaigns/{id}/progress",
    tag = "campaign",
    params(("id" = i64, Path, description = "活动ID")),
    responses(
        (status = 200, description = "获取进度成功", body = CampaignProgressResponse),
        (status = 404, description = "活动不存在")
    )
)]
/// 活动进度汇总 (中奖数 / 已发放金额 / 序列消费 / 各奖项计数), 只读
pub async fn get_progress(
    service: web::Data<CampaignService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.get_progress(path.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
/// 注意: 抽奖相关路由 (draw/reset/results) 在 handlers::draw 里注册,
/// 这里不用 scope, 避免两组 /campaigns 前缀互相吞掉对方的路径
pub fn campaign_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/campaigns", web::post().to(create_campaign))
        .route("/campaigns", web::get().to(list_campaigns))
        .route("/campaigns/{id}", web::get().to(get_campaign))
        .route("/campaigns/{id}", web::delete().to(delete_campaign))
        .route("/campaigns/{id}/activate", web::post().to(activate_campaign))
        .route("/campaigns/{id}/outcomes", web::post().to(add_outcome))
        .route(
            "/campaigns/{id}/outcomes/{outcome_id}",
            web::put().to(update_outcome),
        )
        .route(
            "/campaigns/{id}/outcomes/{outcome_id}",
            web::delete().to(remove_outcome),
        )
        .route("/campaigns/{id}/progress", web::get().to(get_progress));
}
