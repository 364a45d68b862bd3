use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::GameType;
use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::campaign::create_campaign,
        handlers::campaign::list_campaigns,
        handlers::campaign::get_campaign,
        handlers::campaign::activate_campaign,
        handlers::campaign::delete_campaign,
        handlers::campaign::add_outcome,
        handlers::campaign::update_outcome,
        handlers::campaign::remove_outcome,
        handlers::campaign::get_progress,
        handlers::draw::draw,
        handlers::draw::reset,
        handlers::draw::get_results,
    ),
    components(
        schemas(
            ApiError,
            GameType,
            CreateCampaignRequest,
            CampaignResponse,
            CampaignDetailResponse,
            CampaignProgressResponse,
            RotationProgress,
            CreateOutcomeRequest,
            UpdateOutcomeRequest,
            OutcomeResponse,
            DrawPick,
            DrawResponse,
            DrawResultQuery,
            DrawResultResponse,
        )
    ),
    tags(
        (name = "campaign", description = "活动与奖项管理"),
        (name = "draw", description = "抽奖 / 重置 / 历史记录")
    ),
    info(
        title = "Spin Award Backend API",
        description = "配额约束的抽奖引擎 (转盘 / 单骰子 / 三骰子)",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
