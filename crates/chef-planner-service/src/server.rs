use std::io::{self, BufRead, Write};

use chef_planner_catalog::{self as catalog, TemplateEntry};
use chef_planner_core::{
    filter_by_tags, search_ingredients, tag_summary, PricingPolicy, Segment, TemplateCategory,
    VariantGenerator, VariantRequest,
};
use chef_planner_data::{DataSource, Dataset};
use chef_planner_menu::{
    export_csv, export_filename, export_json, export_report, menu_health_score, menu_kpis,
    unlock_recommendations, variety_stats, variety_warnings, ExportKind, ReportContext,
};
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, INVALID_REQUEST, PARSE_ERROR};
use crate::session::{Draft, MenuEntry, Session};

const DEFAULT_STYLES: usize = 3;
const DEFAULT_PARTNER_LIMIT: usize = 10;

#[derive(Debug, Default, Deserialize)]
struct TemplatesParams {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    section: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UnlockParams {
    template: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    forbidden: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PartnersParams {
    ingredient: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct GenerateParams {
    segment: String,
    section: String,
    template: String,
    anchor: String,
    #[serde(default)]
    styles: Option<usize>,
    #[serde(default)]
    target: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RepriceParams {
    draft_id: u64,
    target: f64,
}

#[derive(Debug, Deserialize)]
struct DraftParams {
    draft_id: u64,
}

#[derive(Debug, Deserialize)]
struct MenuIdParams {
    menu_id: u64,
}

#[derive(Debug, Deserialize)]
struct AnalysisParams {
    segment: String,
}

#[derive(Debug, Deserialize)]
struct ExportParams {
    format: String,
    segment: String,
}

/// Line-delimited JSON-RPC 2.0 front end over one dataset and one session.
pub struct PlannerService {
    data: Dataset,
    policy: PricingPolicy,
    rng: Mutex<StdRng>,
    session: Mutex<Session>,
}

impl PlannerService {
    pub fn new(data: Dataset, config: &ServiceConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        info!(
            ingredients = data.catalog.len(),
            segments = data.segments.len(),
            demo = data.is_demo(),
            seeded = config.seed.is_some(),
            points = config.points,
            "planner service ready"
        );
        Self {
            data,
            policy: PricingPolicy::default(),
            rng: Mutex::new(rng),
            session: Mutex::new(Session::new(config.points)),
        }
    }

    /// Loads the configured data directory, or the demo data when it is
    /// unset or unusable.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let data = Dataset::load_dir_or_demo(config.data_dir.as_deref());
        Self::new(data, config)
    }

    pub const fn dataset(&self) -> &Dataset {
        &self.data
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "invalid jsonrpc version",
            ));
        }

        let is_notification = request.id.is_none();
        let id = request.id.unwrap_or(Value::Null);
        debug!(method = %request.method, "request");

        let response = match self.dispatch(&request.method, request.params) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => {
                if !matches!(err, ServiceError::MethodNotFound) {
                    warn!(method = %request.method, error = %err, "request failed");
                }
                JsonRpcResponse::error(id, err.code(), err.to_string())
            }
        };

        if is_notification {
            None
        } else {
            Some(response)
        }
    }

    fn dispatch(&self, method: &str, params: Value) -> Result<Value, ServiceError> {
        match method {
            "ping" => Ok(json!({})),
            "planner/info" => Ok(self.info()),
            "catalog/templates" => self.templates(parse_params(params)?),
            "catalog/unlock" => self.unlock(parse_params(params)?),
            "ingredients/search" => self.search(parse_params(params)?),
            "ingredients/partners" => self.partners(parse_params(params)?),
            "recipes/generate" => self.generate(parse_params(params)?),
            "recipes/reprice" => self.reprice(parse_params(params)?),
            "menu/add" => self.menu_add(parse_params(params)?),
            "menu/remove" => self.menu_remove(parse_params(params)?),
            "menu/list" => Ok(self.menu_list()),
            "menu/analysis" => self.menu_analysis(parse_params(params)?),
            "menu/export" => self.menu_export(parse_params(params)?),
            _ => Err(ServiceError::MethodNotFound),
        }
    }

    fn info(&self) -> Value {
        let session = self.session.lock();
        let source = match &self.data.source {
            DataSource::Directory(dir) => json!({"kind": "directory", "path": dir.display().to_string()}),
            DataSource::Demo => json!({"kind": "demo"}),
        };
        let tags: Vec<Value> = tag_summary(&self.data.catalog)
            .into_iter()
            .map(|(tag, count)| json!({"tag": tag, "count": count}))
            .collect();
        json!({
            "source": source,
            "segments": self.data.segment_names(),
            "sections": catalog::SECTION_NAMES,
            "tags": tags,
            "ingredients": self.data.catalog.len(),
            "matches": self.data.index.edge_count(),
            "warnings": self.data.warnings,
            "points": session.points(),
            "unlocked": session.unlocked(),
        })
    }

    fn segment(&self, name: &str) -> Result<&Segment, ServiceError> {
        self.data
            .segment(name)
            .ok_or_else(|| ServiceError::NotFound(format!("unknown segment '{name}'")))
    }

    fn templates(&self, params: TemplatesParams) -> Result<Value, ServiceError> {
        let category = params
            .category
            .as_deref()
            .map(|label| {
                TemplateCategory::from_label(label).ok_or_else(|| {
                    ServiceError::InvalidParams(format!("unknown category '{label}'"))
                })
            })
            .transpose()?;

        let session = self.session.lock();
        let templates: Vec<Value> = catalog::by_category()
            .into_iter()
            .filter(|(c, _)| category.map_or(true, |wanted| wanted == *c))
            .flat_map(|(_, entries)| entries)
            .map(|entry| template_json(entry, session.is_unlocked(entry)))
            .collect();
        let suggestions: Vec<Value> = params
            .section
            .as_deref()
            .map(catalog::section_suggestions)
            .unwrap_or_default()
            .iter()
            .map(|(template, reason)| json!({"template": template, "reason": reason}))
            .collect();

        let unlockable: Vec<&str> = catalog::unlockable(session.points(), session.unlocked())
            .into_iter()
            .map(|t| t.name)
            .collect();
        let locked: Vec<&str> = catalog::all()
            .iter()
            .filter(|t| !session.is_unlocked(t))
            .map(|t| t.name)
            .collect();

        Ok(json!({
            "points": session.points(),
            "templates": templates,
            "suggestions": suggestions,
            "unlockable": unlockable,
            "cost_to_unlock_all": catalog::total_unlock_cost(&locked),
        }))
    }

    fn unlock(&self, params: UnlockParams) -> Result<Value, ServiceError> {
        let mut session = self.session.lock();
        let remaining = session.unlock(&params.template)?;
        let entry = catalog::template(&params.template)
            .ok_or_else(|| ServiceError::NotFound(format!("unknown template '{}'", params.template)))?;
        info!(template = entry.name, cost = entry.points, remaining, "template unlocked");
        Ok(json!({
            "template": entry.name,
            "cost": entry.points,
            "points": remaining,
        }))
    }

    fn search(&self, params: SearchParams) -> Result<Value, ServiceError> {
        let required: Vec<&str> = params.tags.iter().map(String::as_str).collect();
        let forbidden: Vec<&str> = params.forbidden.iter().map(String::as_str).collect();
        let admitted: Vec<&str> = filter_by_tags(&self.data.catalog, &required, &forbidden)
            .into_iter()
            .map(|i| i.name.as_str())
            .collect();

        let names: Vec<String> = if params.query.trim().is_empty() {
            let mut all: Vec<String> = admitted.iter().map(|n| (*n).to_string()).collect();
            all.sort();
            all
        } else {
            search_ingredients(&self.data.catalog, &params.query)
                .into_iter()
                .filter(|n| admitted.contains(&n.as_str()))
                .collect()
        };

        let ingredients: Vec<Value> = names
            .iter()
            .filter_map(|n| self.data.catalog.get(n))
            .map(|i| json!({"name": i.name, "tags": i.tags}))
            .collect();
        Ok(json!({ "ingredients": ingredients }))
    }

    fn partners(&self, params: PartnersParams) -> Result<Value, ServiceError> {
        let ingredient = self
            .data
            .catalog
            .find_ignore_case(&params.ingredient)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("ingredient '{}' not found", params.ingredient))
            })?;
        let limit = params.limit.unwrap_or(DEFAULT_PARTNER_LIMIT);
        let partners: Vec<Value> = self
            .data
            .index
            .top_partners(&ingredient.name, limit)
            .iter()
            .map(|(name, value)| json!({"name": name, "value": value}))
            .collect();
        Ok(json!({
            "ingredient": ingredient.name,
            "partners": partners,
        }))
    }

    fn generate(&self, params: GenerateParams) -> Result<Value, ServiceError> {
        let segment = self.segment(&params.segment)?;
        let entry = catalog::template(&params.template).ok_or_else(|| {
            ServiceError::NotFound(format!("unknown template '{}'", params.template))
        })?;
        let section = params.section.trim();
        if section.is_empty() {
            return Err(ServiceError::InvalidParams("section must not be empty".to_string()));
        }
        let target = match params.target {
            Some(t) if !t.is_finite() || t < 0.0 => {
                return Err(ServiceError::InvalidParams(format!("invalid target {t}")));
            }
            Some(t) => t,
            None => segment.section(section).cost_expectation,
        };
        let anchor = self
            .data
            .catalog
            .find_ignore_case(&params.anchor)
            .map_or(params.anchor.as_str(), |i| i.name.as_str());

        let mut session = self.session.lock();
        if !session.is_unlocked(entry) {
            return Err(ServiceError::Rejected(format!(
                "template '{}' is locked ({} points to unlock)",
                entry.name, entry.points
            )));
        }

        let template = entry.to_template();
        let generation = {
            let mut rng = self.rng.lock();
            VariantGenerator::new(&self.data.catalog, &self.data.index).generate(
                &VariantRequest {
                    segment,
                    section,
                    template: &template,
                    anchor,
                    styles: params.styles.unwrap_or(DEFAULT_STYLES),
                },
                &mut *rng,
            )?
        };

        let drafts: Vec<Draft> = generation
            .variants
            .into_iter()
            .map(|variant| {
                let id = session.allocate_id();
                Draft::evaluate(
                    id,
                    entry,
                    segment,
                    section,
                    variant,
                    target,
                    &self.data.catalog,
                    &self.policy,
                )
            })
            .collect();
        let body: Vec<Value> = drafts.iter().map(Draft::to_json).collect();
        info!(
            template = entry.name,
            anchor,
            segment = %segment.name,
            drafts = drafts.len(),
            "recipes generated"
        );
        session.replace_drafts(drafts);

        Ok(json!({
            "target": target,
            "advisory": generation.advisory,
            "drafts": body,
        }))
    }

    fn reprice(&self, params: RepriceParams) -> Result<Value, ServiceError> {
        if !params.target.is_finite() || params.target < 0.0 {
            return Err(ServiceError::InvalidParams(format!(
                "invalid target {}",
                params.target
            )));
        }
        let mut session = self.session.lock();
        let draft = session
            .draft(params.draft_id)?
            .repriced(params.target, &self.data.catalog, &self.policy);
        let body = draft.to_json();
        session.replace_draft(draft)?;
        Ok(body)
    }

    fn menu_add(&self, params: DraftParams) -> Result<Value, ServiceError> {
        let mut session = self.session.lock();
        let entry = session.add_to_menu(params.draft_id, &self.data.catalog)?;
        let body = entry.to_json();
        info!(menu_id = entry.id, dish = %entry.item.name(), "dish added to menu");
        Ok(json!({
            "entry": body,
            "menu_size": session.menu().len(),
        }))
    }

    fn menu_remove(&self, params: MenuIdParams) -> Result<Value, ServiceError> {
        let mut session = self.session.lock();
        let removed = session.remove_from_menu(params.menu_id)?;
        Ok(json!({
            "removed": removed.item.name(),
            "menu_size": session.menu().len(),
        }))
    }

    fn menu_list(&self) -> Value {
        let session = self.session.lock();
        let entries: Vec<Value> = session.menu().iter().map(MenuEntry::to_json).collect();
        json!({ "entries": entries })
    }

    fn menu_analysis(&self, params: AnalysisParams) -> Result<Value, ServiceError> {
        let segment = self.segment(&params.segment)?;
        let session = self.session.lock();
        let items = session.menu_items();

        let kpis = menu_kpis(&items, segment);
        let warnings = variety_warnings(&items, segment);
        let health = menu_health_score(&kpis, warnings.len());
        let recommendations =
            unlock_recommendations(&items, segment, session.unlocked(), session.points());
        Ok(json!({
            "segment": segment.name,
            "health_score": health,
            "kpis": kpis,
            "warnings": warnings,
            "recommendations": recommendations,
            "variety": variety_stats(&items),
        }))
    }

    fn menu_export(&self, params: ExportParams) -> Result<Value, ServiceError> {
        let kind = ExportKind::from_label(&params.format).ok_or_else(|| {
            ServiceError::InvalidParams(format!("unknown export format '{}'", params.format))
        })?;
        let segment = self.segment(&params.segment)?;
        let session = self.session.lock();
        let items = session.menu_items();
        let now = Utc::now();

        let content = match kind {
            ExportKind::Csv => export_csv(&items),
            ExportKind::Json => export_json(&items, now)?,
            ExportKind::Report => {
                let kpis = menu_kpis(&items, segment);
                let warnings = variety_warnings(&items, segment);
                let recommendations =
                    unlock_recommendations(&items, segment, session.unlocked(), session.points());
                export_report(
                    &items,
                    &ReportContext {
                        segment_name: &segment.name,
                        kpis: &kpis,
                        warnings: &warnings,
                        recommendations: &recommendations,
                        exported_at: now,
                    },
                )
            }
        };
        Ok(json!({
            "format": kind.extension(),
            "filename": export_filename(kind, &segment.name, now),
            "content": content,
        }))
    }

    pub fn serve_stdio(&self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// One request per line in, one response per line out. Blank lines are
    /// skipped and notifications get no reply.
    pub fn serve<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> io::Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                Ok(request) => self.handle_request(request),
                Err(err) => Some(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("parse error: {err}"),
                )),
            };
            if let Some(response) = response {
                write_response(&mut writer, &response)?;
            }
        }
        info!("input closed, shutting down");
        Ok(())
    }
}

fn write_response<W: Write>(writer: &mut W, response: &JsonRpcResponse) -> io::Result<()> {
    let serialized = serde_json::to_string(response)?;
    writeln!(writer, "{serialized}")?;
    writer.flush()
}

/// Missing or null params read as an empty object.
fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, ServiceError> {
    let params = if params.is_null() {
        Value::Object(Map::new())
    } else {
        params
    };
    serde_json::from_value(params).map_err(|err| ServiceError::InvalidParams(err.to_string()))
}

fn template_json(entry: &TemplateEntry, unlocked: bool) -> Value {
    json!({
        "name": entry.name,
        "category": entry.category.label(),
        "points": entry.points,
        "description": entry.description,
        "unlocked": unlocked,
    })
}
