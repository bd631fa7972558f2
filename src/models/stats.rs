use serde::Serialize;

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsOverview {
    pub total_users: i64,
    pub active_users: i64,
    pub total_posts: i64,
    pub approved_posts: i64,
    pub pending_posts: i64,
    pub total_knowledge: i64,
    pub total_notifications: i64,
    pub new_users_last7_days: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub post_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoleCount {
    pub role: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsBreakdown {
    pub posts_by_type: Vec<TypeCount>,
    pub users_by_role: Vec<RoleCount>,
    pub knowledge_by_category: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct AdminStats {
    pub overview: StatsOverview,
    pub breakdown: StatsBreakdown,
}
