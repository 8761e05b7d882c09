//! Platform adapter for BOSS直聘 (zhipin.com).
//!
//! All zhipin-specific knowledge lives here: endpoint paths, the
//! `{code, message, zpData}` response envelope, city codes, and payload
//! field names. The pipeline only sees the capability contract.

use chrono::Utc;
use jobpilot_core::config::{PlatformConfig, ProxyConfig};
use jobpilot_core::error::AppError;
use jobpilot_core::models::{CandidateProfile, Education, JobDetail, JobListing, WorkExperience};
use jobpilot_core::traits::JobPlatform;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::http::HttpClient;

pub const PLATFORM_NAME: &str = "zhipin";
const DEFAULT_BASE_URL: &str = "https://www.zhipin.com";
const PAGE_SIZE: u32 = 30;

/// [`JobPlatform`] implementation for zhipin.
#[derive(Clone)]
pub struct ZhipinPlatform {
    http: HttpClient,
    base_url: String,
    session_token: String,
}

impl ZhipinPlatform {
    pub fn new(cfg: &PlatformConfig, proxy: &ProxyConfig) -> Result<Self, AppError> {
        let base_url = cfg
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Url::parse(&base_url)
            .map_err(|e| AppError::Config(format!("invalid zhipin base URL: {e}")))?;
        Ok(Self {
            http: HttpClient::new(proxy)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token: cfg.session_token.clone(),
        })
    }

    fn cookie(&self) -> String {
        // wt2 is the session cookie zhipin issues at login.
        format!("wt2={}", self.session_token)
    }

    /// GET an API endpoint and unwrap the zhipin envelope.
    async fn get_data(&self, path: &str, query: &[(&str, String)]) -> Result<Value, AppError> {
        let url = format!("{}{path}", self.base_url);
        let request = self
            .http
            .get(&url)
            .header("Cookie", self.cookie())
            .query(query);
        let response = self.http.send(request).await?;
        unwrap_envelope(path, &response.body, response.status)
    }

    async fn post_data(&self, path: &str, payload: &Value) -> Result<Value, AppError> {
        let url = format!("{}{path}", self.base_url);
        let request = self
            .http
            .post(&url)
            .header("Cookie", self.cookie())
            .json(payload);
        let response = self.http.send(request).await?;
        unwrap_envelope(path, &response.body, response.status)
    }
}

impl JobPlatform for ZhipinPlatform {
    fn name(&self) -> &str {
        PLATFORM_NAME
    }

    async fn check_session(&self) -> bool {
        match self.get_data("/wapi/zpuser/wap/getUserInfo.json", &[]).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "zhipin session check failed");
                false
            }
        }
    }

    async fn fetch_profile(&self) -> Option<CandidateProfile> {
        match self.get_data("/wapi/zpgeek/resume/query.json", &[]).await {
            Ok(data) => parse_profile(&data),
            Err(e) => {
                tracing::warn!(error = %e, "zhipin profile fetch failed");
                None
            }
        }
    }

    async fn search_jobs(
        &self,
        keyword: &str,
        city: &str,
        page: u32,
    ) -> Result<Vec<JobListing>, AppError> {
        let query = [
            ("query", keyword.to_string()),
            ("city", city_code(city).to_string()),
            ("page", page.to_string()),
            ("pageSize", PAGE_SIZE.to_string()),
        ];
        let data = self
            .get_data("/wapi/zpgeek/search/joblist.json", &query)
            .await?;
        Ok(parse_listings(&data, &self.base_url))
    }

    async fn fetch_detail(&self, job_id: &str) -> Result<JobDetail, AppError> {
        let query = [("encryptJobId", job_id.to_string())];
        let data = self.get_data("/wapi/zpgeek/job/detail.json", &query).await?;
        parse_detail(&data)
    }

    async fn apply(&self, listing: &JobListing, greeting: &str) -> Result<(), AppError> {
        // The friend request carries the opening message; there is no
        // separate send step for the first contact.
        let payload = serde_json::json!({
            "encryptJobId": listing.id,
            "greeting": greeting,
        });
        self.post_data("/wapi/zpgeek/friend/add.json", &payload)
            .await
            .map_err(|e| match e {
                AppError::HttpError(message) => AppError::ApplyRejected(message),
                other => other,
            })?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Envelope and payload parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default, rename = "zpData")]
    zp_data: Value,
}

/// Decode a response body as the zhipin `{code, message, zpData}`
/// envelope, mapping auth statuses and nonzero codes to errors.
fn unwrap_envelope(path: &str, body: &str, status: u16) -> Result<Value, AppError> {
    if status == 401 || status == 403 {
        return Err(AppError::SessionInvalid(format!("HTTP {status} for {path}")));
    }
    if !(200..300).contains(&status) {
        return Err(AppError::HttpError(format!("HTTP {status} for {path}")));
    }
    let envelope: Envelope = serde_json::from_str(body).map_err(|e| {
        let prefix: String = body.chars().take(120).collect();
        AppError::ParseError(format!("{path}: {e}: {prefix}"))
    })?;
    match envelope.code {
        0 => Ok(envelope.zp_data),
        // 37 is zhipin's "login required".
        37 => Err(AppError::SessionInvalid(envelope.message)),
        code => Err(AppError::HttpError(format!(
            "{path}: API code {code}: {}",
            envelope.message
        ))),
    }
}

fn parse_listings(zp_data: &Value, base_url: &str) -> Vec<JobListing> {
    let Some(jobs) = zp_data.get("jobList").and_then(Value::as_array) else {
        return Vec::new();
    };
    jobs.iter()
        .filter_map(|job| parse_listing(job, base_url))
        .collect()
}

fn parse_listing(job: &Value, base_url: &str) -> Option<JobListing> {
    let id = text(job, "encryptJobId")?;
    Some(JobListing {
        url: format!("{base_url}/job_detail/{id}.html"),
        id,
        title: text(job, "jobName")?,
        company: text(job, "brandName").unwrap_or_default(),
        salary_text: text(job, "salaryDesc").unwrap_or_default(),
        city: text(job, "cityName").unwrap_or_default(),
        hr_name: text(job, "bossName").unwrap_or_default(),
        hr_title: text(job, "bossTitle").unwrap_or_default(),
        hr_activity: text(job, "activeTimeDesc").unwrap_or_default(),
        platform: PLATFORM_NAME.to_string(),
        discovered_at: Utc::now(),
        description: None,
        score: None,
    })
}

fn parse_detail(zp_data: &Value) -> Result<JobDetail, AppError> {
    let info = zp_data.get("jobInfo").unwrap_or(zp_data);
    let description = text(info, "postDescription")
        .ok_or_else(|| AppError::ParseError("job detail missing postDescription".into()))?;
    let brand = zp_data.get("brandComInfo").unwrap_or(zp_data);
    Ok(JobDetail {
        description,
        company_scale: text(brand, "scaleName"),
        company_industry: text(brand, "industryName"),
    })
}

fn parse_profile(zp_data: &Value) -> Option<CandidateProfile> {
    let geek = zp_data.get("geekDetailInfo").unwrap_or(zp_data);
    let base = geek.get("geekBaseInfo").unwrap_or(geek);
    let name = text(base, "name")?;

    let work_history = geek
        .get("geekWorks")
        .and_then(Value::as_array)
        .map(|works| {
            works
                .iter()
                .map(|w| WorkExperience {
                    company: text(w, "company").unwrap_or_default(),
                    position: text(w, "positionName").unwrap_or_default(),
                    start_date: text(w, "startDate").unwrap_or_default(),
                    end_date: text(w, "endDate").unwrap_or_default(),
                    description: text(w, "responsibility").unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    let education = geek
        .get("geekEdus")
        .and_then(Value::as_array)
        .map(|edus| {
            edus.iter()
                .map(|e| Education {
                    school: text(e, "school").unwrap_or_default(),
                    degree: text(e, "degreeName").unwrap_or_default(),
                    major: text(e, "major").unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    let skills = geek
        .get("skills")
        .and_then(Value::as_array)
        .map(|skills| {
            skills
                .iter()
                .filter_map(|s| s.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    Some(CandidateProfile {
        name,
        years_of_experience: base.get("workYears").and_then(Value::as_u64).map(|y| y as u32),
        work_history,
        education,
        skills,
    })
}

fn text(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Map a configured city name to zhipin's numeric city code. Unknown
/// names pass through unchanged so raw codes can be configured directly.
fn city_code(city: &str) -> &str {
    match city.trim().to_lowercase().as_str() {
        "beijing" | "北京" => "101010100",
        "shanghai" | "上海" => "101020100",
        "guangzhou" | "广州" => "101280100",
        "shenzhen" | "深圳" => "101280600",
        "hangzhou" | "杭州" => "101210100",
        "chengdu" | "成都" => "101270100",
        "nanjing" | "南京" => "101190100",
        "wuhan" | "武汉" => "101200100",
        "xi'an" | "xian" | "西安" => "101110100",
        "suzhou" | "苏州" => "101190400",
        _ => city,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_code_table() {
        assert_eq!(city_code("Beijing"), "101010100");
        assert_eq!(city_code("上海"), "101020100");
        assert_eq!(city_code(" shenzhen "), "101280600");
        // Raw codes and unknown names pass through.
        assert_eq!(city_code("101250100"), "101250100");
    }

    #[test]
    fn envelope_ok_yields_data() {
        let body = r#"{"code": 0, "message": "Success", "zpData": {"jobList": []}}"#;
        let data = unwrap_envelope("/x", body, 200).unwrap();
        assert!(data.get("jobList").is_some());
    }

    #[test]
    fn envelope_login_required_is_session_invalid() {
        let body = r#"{"code": 37, "message": "您的登录状态已失效"}"#;
        assert!(matches!(
            unwrap_envelope("/x", body, 200),
            Err(AppError::SessionInvalid(_))
        ));
        assert!(matches!(
            unwrap_envelope("/x", "", 401),
            Err(AppError::SessionInvalid(_))
        ));
    }

    #[test]
    fn envelope_other_codes_are_http_errors() {
        let body = r#"{"code": 5, "message": "rate limited"}"#;
        let err = unwrap_envelope("/x", body, 200).unwrap_err();
        assert!(err.to_string().contains("code 5"));
    }

    #[test]
    fn envelope_html_body_is_a_parse_error() {
        assert!(matches!(
            unwrap_envelope("/x", "<html>blocked</html>", 200),
            Err(AppError::ParseError(_))
        ));
    }

    #[test]
    fn listing_mapping_from_search_payload() {
        let zp_data = serde_json::json!({
            "jobList": [
                {
                    "encryptJobId": "abc123",
                    "jobName": "Rust工程师",
                    "brandName": "Initech",
                    "salaryDesc": "25-50K",
                    "cityName": "北京",
                    "bossName": "Sam",
                    "bossTitle": "HR",
                    "activeTimeDesc": "刚刚活跃"
                },
                {
                    "jobName": "missing id, skipped"
                }
            ]
        });
        let listings = parse_listings(&zp_data, "https://www.zhipin.com");
        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(listing.id, "abc123");
        assert_eq!(listing.platform, "zhipin");
        assert_eq!(listing.url, "https://www.zhipin.com/job_detail/abc123.html");
        assert_eq!(listing.salary_text, "25-50K");
    }

    #[test]
    fn missing_job_list_is_an_empty_page() {
        let zp_data = serde_json::json!({"totalCount": 0});
        assert!(parse_listings(&zp_data, "https://www.zhipin.com").is_empty());
    }

    #[test]
    fn detail_mapping() {
        let zp_data = serde_json::json!({
            "jobInfo": {"postDescription": "Build backend services in Rust."},
            "brandComInfo": {"scaleName": "100-499", "industryName": "Internet"}
        });
        let detail = parse_detail(&zp_data).unwrap();
        assert_eq!(detail.description, "Build backend services in Rust.");
        assert_eq!(detail.company_scale.as_deref(), Some("100-499"));
    }

    #[test]
    fn detail_without_description_is_an_error() {
        let zp_data = serde_json::json!({"jobInfo": {}});
        assert!(matches!(
            parse_detail(&zp_data),
            Err(AppError::ParseError(_))
        ));
    }

    #[test]
    fn profile_mapping() {
        let zp_data = serde_json::json!({
            "geekDetailInfo": {
                "geekBaseInfo": {"name": "Jane Doe", "workYears": 5},
                "geekWorks": [
                    {"company": "Initech", "positionName": "Engineer",
                     "startDate": "2020-01", "endDate": "2024-06",
                     "responsibility": "Built services."}
                ],
                "geekEdus": [
                    {"school": "Tsinghua", "degreeName": "BSc", "major": "CS"}
                ],
                "skills": ["Rust", "SQL"]
            }
        });
        let profile = parse_profile(&zp_data).unwrap();
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.years_of_experience, Some(5));
        assert_eq!(profile.work_history.len(), 1);
        assert_eq!(profile.skills, vec!["Rust", "SQL"]);
    }

    #[test]
    fn profile_without_name_is_none() {
        let zp_data = serde_json::json!({"geekDetailInfo": {"geekBaseInfo": {}}});
        assert!(parse_profile(&zp_data).is_none());
    }
}
