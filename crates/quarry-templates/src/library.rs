// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The static template table.
//!
//! Order matters: templates and their patterns are scanned in declaration
//! order, and on equal confidence the earlier pair wins.

use std::sync::LazyLock;

use quarry_core::{QueryConfig, QueryOperation, AGGREGATE_MODEL};
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use strum::{Display, EnumString};

use crate::params::{ParamType, ParamValue, ParameterDefinition, Params};

/// Pure function from extracted parameters to a query.
pub type QueryBuilder = fn(&Params) -> QueryConfig;

/// Grouping used for listings and related-question suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Products,
    Tasks,
    Customers,
    Adoption,
    Telemetry,
    Analytics,
}

/// An immutable question template.
#[derive(Debug, Clone)]
pub struct Template {
    pub id: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub patterns: Vec<Regex>,
    pub parameters: Vec<ParameterDefinition>,
    pub examples: &'static [&'static str],
    builder: QueryBuilder,
}

impl Template {
    /// Build the template's query from already-extracted parameters.
    pub fn build_query(&self, params: &Params) -> QueryConfig {
        (self.builder)(params)
    }

    /// Names of required parameters missing from `params`.
    pub fn missing_required(&self, params: &Params) -> Vec<&'static str> {
        self.parameters
            .iter()
            .filter(|p| p.required && !params.contains(p.name))
            .map(|p| p.name)
            .collect()
    }

    /// Extract every parameter this template declares from `question`.
    pub fn extract_params(&self, question: &str) -> Params {
        self.parameters
            .iter()
            .filter_map(|def| def.extract_from(question).map(|v| (def.name.to_string(), v)))
            .collect()
    }
}

/// Ordered collection of templates.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
}

static STANDARD: LazyLock<TemplateLibrary> = LazyLock::new(|| TemplateLibrary {
    templates: standard_templates(),
});

impl TemplateLibrary {
    /// The built-in library, compiled once per process.
    pub fn standard() -> &'static TemplateLibrary {
        &STANDARD
    }

    pub fn from_templates(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Template> {
        self.templates.iter().filter(move |t| t.category == category)
    }

    /// Example questions from other templates in the same category.
    pub fn related_questions(&self, template_id: &str, limit: usize) -> Vec<&'static str> {
        let Some(template) = self.get(template_id) else {
            return Vec::new();
        };
        self.by_category(template.category)
            .filter(|t| t.id != template_id)
            .filter_map(|t| t.examples.first().copied())
            .take(limit)
            .collect()
    }
}

fn pattern(source: &str) -> Regex {
    // Constant table; a bad pattern is a programming error caught by tests.
    Regex::new(&format!("(?i){source}")).expect("valid template pattern")
}

fn template(
    id: &'static str,
    description: &'static str,
    category: Category,
    patterns: &[&str],
    parameters: Vec<ParameterDefinition>,
    builder: QueryBuilder,
    examples: &'static [&'static str],
) -> Template {
    Template {
        id,
        description,
        category,
        patterns: patterns.iter().map(|p| pattern(p)).collect(),
        parameters,
        examples,
        builder,
    }
}

fn string_param(name: &'static str, extract: &str) -> ParameterDefinition {
    ParameterDefinition {
        name,
        param_type: ParamType::String,
        extract: Some(pattern(extract)),
        default: None,
        required: true,
    }
}

fn find_many(model: &str, args: serde_json::Value) -> QueryConfig {
    QueryConfig::new(model, QueryOperation::FindMany, args)
}

fn standard_templates() -> Vec<Template> {
    vec![
        // products
        template(
            "list_products",
            "List all products in the system",
            Category::Products,
            &[
                r"(?:show|list|get|display)\s+(?:me\s+)?(?:all\s+)?(?:the\s+)?products?(?:\s+we\s+have)?",
                r"what\s+products?\s+(?:do\s+we\s+have|are\s+there|exist)",
                r"products?\s+list",
            ],
            vec![],
            build_list_products,
            &["Show me all products", "List products", "What products do we have?"],
        ),
        template(
            "products_without_telemetry",
            "Find products that have tasks without telemetry attributes configured",
            Category::Products,
            &[
                r"products?\s+(?:without|missing|with\s+no)\s+telemetry",
                r"products?\s+(?:that\s+)?(?:have|with)\s+tasks?\s+(?:without|missing|with\s+no)\s+telemetry",
                r"(?:find|show|list)\s+products?\s+(?:without|missing|with\s+no)\s+telemetry",
                r"products?\s+(?:that\s+)?have\s+no\s+telemetry",
            ],
            vec![],
            build_products_without_telemetry,
            &[
                "Show products without telemetry",
                "Products with tasks missing telemetry",
                "Products with no telemetry",
            ],
        ),
        template(
            "products_without_customers",
            "Find products that have no customers assigned",
            Category::Products,
            &[
                r"products?\s+(?:without|with\s+no|missing)\s+customers?",
                r"products?\s+(?:not\s+)?assigned\s+to\s+(?:any\s+)?customers?",
                r"(?:find|show|list)\s+products?\s+(?:without|with\s+no)\s+customers?",
                r"unassigned\s+products?",
            ],
            vec![],
            build_products_without_customers,
            &[
                "Show products without customers",
                "Find unassigned products",
                "Products with no customers",
            ],
        ),
        // tasks
        template(
            "tasks_zero_weight",
            "Find tasks that have zero or no weight assigned",
            Category::Tasks,
            &[
                r"tasks?\s+with\s+(?:zero|0|no)\s+weight",
                r"tasks?\s+(?:missing|without)\s+weight",
                r"(?:find|show|list)\s+tasks?\s+(?:with\s+)?(?:zero|0|no)\s+weight",
                r"unweighted\s+tasks?",
            ],
            vec![],
            build_tasks_zero_weight,
            &["Find tasks with zero weight", "Show tasks without weight", "Unweighted tasks"],
        ),
        template(
            "tasks_missing_descriptions",
            "Find tasks that have no description",
            Category::Tasks,
            &[
                r"tasks?\s+(?:without|missing|with\s+no)\s+(?:a\s+)?descriptions?",
                r"tasks?\s+(?:that\s+)?(?:have|has)\s+no\s+descriptions?",
                r"(?:find|show|list)\s+tasks?\s+(?:without|missing)\s+descriptions?",
            ],
            vec![],
            build_tasks_missing_descriptions,
            &[
                "Find tasks missing descriptions",
                "Show tasks without descriptions",
                "Tasks with no description",
            ],
        ),
        template(
            "tasks_for_product_no_telemetry",
            "Find tasks for a specific product that have no telemetry",
            Category::Tasks,
            &[
                r"(?:find|show|list|get)\s+(?:me\s+)?(?:all\s+)?(?:the\s+)?tasks?\s+(?:of|for)\s+(.+?)\s+(?:without|missing|with\s+no)\s+telemetry",
                r"tasks?\s+(?:of|for)\s+(.+?)\s+(?:with\s+no|without)\s+telemetry",
                r"(?:find|show|list|get)\s+(?:me\s+)?(?:all\s+)?(?:the\s+)?tasks?\s+(?:of|for)\s+(.+?)\s+that\s+(?:does\s+not\s+have|doesn'?t\s+have|do\s+not\s+have|don'?t\s+have|has\s+no|lacks?)\s+telemetry",
                r"(?:find|show|list|get)\s+(?:me\s+)?(?:all\s+)?(?:the\s+)?tasks?\s+(?:without|missing|with\s+no)\s+telemetry\s+(?:of|for|in)\s+(.+)",
                r"(.+?)\s+tasks?\s+(?:without|missing|with\s+no)\s+telemetry",
            ],
            vec![string_param(
                "productName",
                r"tasks?\s+(?:of|for)\s+(.+?)\s+(?:that\s+)?(?:without|missing|with\s+no|lacking|has\s+no|lacks?|does\s+not\s+have|doesn'?t\s+have)\s+telemetry|(?:without|missing|with\s+no)\s+telemetry\s+(?:of|for|in)\s+(.+)|^(.+?)\s+tasks?\s+(?:without|missing|with\s+no)\s+telemetry\s*$",
            )],
            build_tasks_for_product_no_telemetry,
            &[
                "Show tasks for Secure Firewall without telemetry",
                "Tasks of XDR with no telemetry",
                "Find tasks without telemetry for Duo",
            ],
        ),
        template(
            "tasks_high_time",
            "Find tasks with high estimated time",
            Category::Tasks,
            &[
                r"tasks?\s+(?:with\s+)?(?:high|long|lengthy|over\s+\d+)\s+(?:est(?:imated)?\.?\s*)?(?:time|minutes?|hours?)",
                r"(?:time|minute)[\s-]*consuming\s+tasks?",
                r"(?:find|show|list)\s+tasks?\s+(?:that\s+)?take\s+(?:a\s+)?long\s+time",
            ],
            vec![],
            build_tasks_high_time,
            &[
                "Find tasks with high estimated time",
                "Show time-consuming tasks",
                "List tasks that take a long time",
            ],
        ),
        template(
            "tasks_missing_time",
            "Find tasks with zero or no estimated time",
            Category::Tasks,
            &[
                r"tasks?\s+(?:with\s+)?(?:zero|0|no|missing)\s+(?:est(?:imated)?\.?\s*)?(?:time|minutes?)",
                r"tasks?\s+(?:without|missing)\s+(?:est(?:imated)?\.?\s*)?(?:time|minutes?)",
                r"(?:find|show|list)\s+tasks?\s+(?:with\s+)?(?:no|zero|missing)\s+(?:est(?:imated)?\.?\s*)?time",
            ],
            vec![],
            build_tasks_missing_time,
            &[
                "Find tasks with no estimated time",
                "Show tasks missing estimated time",
                "Tasks with zero estimated minutes",
            ],
        ),
        template(
            "tasks_for_product",
            "List all tasks for a specific product",
            Category::Tasks,
            &[
                r"(?:find|show|list|get)\s+(?:all\s+)?(?:the\s+)?tasks?\s+(?:of|for|in)\s+(?:product\s+)?(.+)",
                r"tasks?\s+(?:of|for|in)\s+(?:product\s+)?(.+)",
                r"what\s+(?:are\s+)?(?:all\s+)?(?:the\s+)?tasks?\s+(?:of|for|in)\s+(.+)",
            ],
            vec![string_param("productName", r"(?:of|for|in)\s+(?:product\s+)?(.+)")],
            build_tasks_for_product,
            &[
                "List all tasks for Secure Access",
                "Tasks of Secure Firewall",
                "Show tasks for XDR",
            ],
        ),
        template(
            "tasks_high_weight",
            "Find tasks with high weight or importance",
            Category::Tasks,
            &[
                r"tasks?\s+(?:with\s+)?(?:high|heavy|large)\s+weight",
                r"(?:important|critical|weighted)\s+tasks?",
                r"(?:find|show|list)\s+(?:high|heavy)(?:\s+weight)?\s+tasks?",
            ],
            vec![],
            build_tasks_high_weight,
            &["Find tasks with high weight", "Show important tasks", "Critical tasks"],
        ),
        // customers
        template(
            "list_customers",
            "List all customers in the system",
            Category::Customers,
            &[
                r"(?:show|list|get|display)\s+(?:me\s+)?(?:all\s+)?(?:the\s+)?customers?",
                r"what\s+customers?\s+(?:do\s+we\s+have|are\s+there|exist)",
                r"customers?\s+list",
            ],
            vec![],
            build_list_customers,
            &["Show me all customers", "List customers", "What customers do we have?"],
        ),
        template(
            "customers_low_adoption",
            "Find customers with adoption progress below a threshold",
            Category::Customers,
            &[
                r"customers?\s+(?:with\s+)?(?:adoption|progress)\s+(?:below|under|less\s+than)\s+(\d+)",
                r"customers?\s+(?:with\s+)?low\s+adoption",
                r"(?:find|show|list)\s+customers?\s+(?:with\s+)?(?:adoption|progress)\s+(?:below|under|<)\s*(\d+)",
                r"struggling\s+customers?",
            ],
            vec![ParameterDefinition {
                name: "threshold",
                param_type: ParamType::Number,
                extract: Some(pattern(r"(?:below|under|less\s+than|<)\s*(\d+)")),
                default: Some(ParamValue::Number(LOW_ADOPTION_DEFAULT)),
                required: false,
            }],
            build_customers_low_adoption,
            &[
                "Show customers with adoption below 50%",
                "Customers with progress under 30%",
                "Find struggling customers",
            ],
        ),
        template(
            "customers_not_started",
            "Find customers who have not started their adoption",
            Category::Customers,
            &[
                r"customers?\s+(?:that\s+)?(?:have\s+)?not\s+started",
                r"customers?\s+(?:with\s+)?(?:zero|0|no)\s+(?:adoption\s+)?progress",
                r"(?:find|show|list)\s+customers?\s+(?:that\s+)?(?:have\s+)?not\s+started",
                r"inactive\s+customers?",
            ],
            vec![],
            build_customers_not_started,
            &[
                "Show customers that have not started",
                "Find inactive customers",
                "Customers with zero progress",
            ],
        ),
        // adoption
        template(
            "list_adoption_plans",
            "List all product and solution adoption plans",
            Category::Adoption,
            &[
                r"(?:list|show|find)\s+(?:all\s+)?(?:the\s+)?(?:adoption\s+plans?|assignments?)$",
                r"(?:list|show|find)\s+(?:all\s+)?(?:product|solution)\s+(?:adoption\s+plans?|assignments?)",
                r"(?:adoption\s+plans?|assignments?)\s+(?:for\s+)?all\s+customers?",
                r"what\s+(?:adoption\s+plans?|assignments?)\s+(?:do\s+we\s+have|exist)",
            ],
            vec![],
            build_list_adoption_plans,
            &[
                "List all adoption plans",
                "Show all product assignments",
                "What adoption plans do we have?",
            ],
        ),
        template(
            "adoption_plans_for_customer",
            "Find adoption plans for a specific customer",
            Category::Adoption,
            &[
                r"(?:adoption\s+plans?|assignments?)\s+(?:for|of)\s+(?:customer\s+)?(.+)",
                r"(?:list|show|find)\s+(?:the\s+)?(?:adoption\s+plans?|assignments?)\s+(?:for|of)\s+(.+)",
                r"what\s+(?:products?|solutions?)\s+(?:is|are)\s+(.+?)\s+(?:using|adopting|assigned)",
            ],
            vec![string_param(
                "customerName",
                r"(?:(?:for|of)\s+(?:customer\s+)?|(?:is|are)\s+)(.+?)(?:\s+(?:using|adopting|assigned)|$)",
            )],
            build_adoption_plans_for_customer,
            &[
                "Adoption plans for Acme Corp",
                "Show assignments for customer Globex",
                "What products is Initech using?",
            ],
        ),
        // telemetry
        template(
            "telemetry_no_criteria",
            "Find telemetry attributes that have no success criteria defined",
            Category::Telemetry,
            &[
                r"telemetry\s+(?:attributes?\s+)?(?:without|missing|with\s+no)\s+(?:success\s+)?criteria",
                r"(?:find|show|list)\s+telemetry\s+(?:without|missing)\s+criteria",
                r"unconfigured\s+telemetry",
            ],
            vec![],
            build_telemetry_no_criteria,
            &[
                "Show telemetry without success criteria",
                "Find telemetry missing criteria",
                "Unconfigured telemetry attributes",
            ],
        ),
        // analytics
        template(
            "count_entities",
            "Get counts of products, solutions, customers, and tasks",
            Category::Analytics,
            &[
                r"(?:how\s+many|count\s+of|number\s+of)\s*(?:products?|solutions?|customers?|tasks?)?",
                r"(?:total|overall)\s+(?:products?|solutions?|customers?|tasks?)",
                r"(?:show|give)\s+(?:me\s+)?(?:the\s+|an\s+)?(?:counts?|overview|summary|totals)",
                r"summary\s+(?:of\s+)?(?:data|entities|counts)",
                r"^overview$",
            ],
            vec![],
            build_count_entities,
            &[
                "How many products do we have?",
                "Count of customers",
                "Show me the totals",
                "Give me an overview",
            ],
        ),
    ]
}

const LOW_ADOPTION_DEFAULT: f64 = 50.0;

fn build_list_products(_: &Params) -> QueryConfig {
    find_many(
        "product",
        json!({
            "where": { "deletedAt": null },
            "select": {
                "id": true, "name": true, "description": true, "createdAt": true,
                "_count": { "select": { "tasks": true, "customers": true } }
            },
            "orderBy": { "name": "asc" }
        }),
    )
}

fn build_products_without_telemetry(_: &Params) -> QueryConfig {
    let untelemetered = json!({
        "deletedAt": null,
        "NOT": { "telemetryAttributes": { "some": {} } }
    });
    find_many(
        "product",
        json!({
            "where": { "deletedAt": null, "tasks": { "some": untelemetered.clone() } },
            "select": {
                "id": true, "name": true, "description": true,
                "tasks": { "where": untelemetered, "select": { "id": true, "name": true } }
            }
        }),
    )
}

fn build_products_without_customers(_: &Params) -> QueryConfig {
    find_many(
        "product",
        json!({
            "where": { "deletedAt": null, "NOT": { "customers": { "some": {} } } },
            "select": { "id": true, "name": true, "description": true, "createdAt": true }
        }),
    )
}

fn task_owner_select() -> serde_json::Value {
    json!({ "select": { "id": true, "name": true } })
}

fn build_tasks_zero_weight(_: &Params) -> QueryConfig {
    find_many(
        "task",
        json!({
            "where": { "deletedAt": null, "weight": 0 },
            "select": {
                "id": true, "name": true, "weight": true,
                "product": task_owner_select(), "solution": task_owner_select()
            }
        }),
    )
}

fn build_tasks_missing_descriptions(_: &Params) -> QueryConfig {
    find_many(
        "task",
        json!({
            "where": {
                "deletedAt": null,
                "OR": [ { "description": null }, { "description": "" } ]
            },
            "select": {
                "id": true, "name": true, "description": true,
                "product": task_owner_select(), "solution": task_owner_select()
            }
        }),
    )
}

fn product_name_filter(params: &Params) -> serde_json::Value {
    json!({ "name": { "contains": params.json("productName"), "mode": "insensitive" } })
}

fn task_detail_select() -> serde_json::Value {
    json!({
        "id": true, "name": true, "description": true, "weight": true,
        "estMinutes": true, "howToDoc": true, "howToVideo": true,
        "product": task_owner_select(),
        "_count": { "select": { "telemetryAttributes": true } }
    })
}

fn build_tasks_for_product_no_telemetry(params: &Params) -> QueryConfig {
    find_many(
        "task",
        json!({
            "where": {
                "deletedAt": null,
                "product": product_name_filter(params),
                "NOT": { "telemetryAttributes": { "some": {} } }
            },
            "select": task_detail_select()
        }),
    )
}

fn build_tasks_high_time(_: &Params) -> QueryConfig {
    find_many(
        "task",
        json!({
            "where": { "deletedAt": null, "estMinutes": { "gt": 60 } },
            "orderBy": { "estMinutes": "desc" },
            "select": {
                "id": true, "name": true, "description": true, "estMinutes": true,
                "weight": true, "product": task_owner_select()
            }
        }),
    )
}

fn build_tasks_missing_time(_: &Params) -> QueryConfig {
    find_many(
        "task",
        json!({
            "where": {
                "deletedAt": null,
                "OR": [ { "estMinutes": null }, { "estMinutes": 0 } ]
            },
            "select": {
                "id": true, "name": true, "description": true, "estMinutes": true,
                "weight": true, "product": task_owner_select()
            }
        }),
    )
}

fn build_tasks_for_product(params: &Params) -> QueryConfig {
    find_many(
        "task",
        json!({
            "where": { "deletedAt": null, "product": product_name_filter(params) },
            "orderBy": { "sequenceNumber": "asc" },
            "select": task_detail_select()
        }),
    )
}

fn build_tasks_high_weight(_: &Params) -> QueryConfig {
    find_many(
        "task",
        json!({
            "where": { "deletedAt": null, "weight": { "gt": 50 } },
            "orderBy": { "weight": "desc" },
            "select": {
                "id": true, "name": true, "description": true, "weight": true,
                "estMinutes": true, "product": task_owner_select()
            }
        }),
    )
}

fn build_list_customers(_: &Params) -> QueryConfig {
    find_many(
        "customer",
        json!({
            "where": { "deletedAt": null },
            "select": {
                "id": true, "name": true, "description": true, "createdAt": true,
                "_count": { "select": { "products": true, "solutions": true } }
            },
            "orderBy": { "name": "asc" }
        }),
    )
}

fn build_customers_low_adoption(params: &Params) -> QueryConfig {
    let threshold = params.number("threshold").unwrap_or(LOW_ADOPTION_DEFAULT);
    find_many(
        "customer",
        json!({
            "where": {
                "deletedAt": null,
                "products": { "some": { "adoptionPlan": { "progressPercentage": { "lt": threshold } } } }
            },
            "select": {
                "id": true, "name": true,
                "products": { "select": {
                    "id": true, "name": true,
                    "product": { "select": { "name": true } },
                    "adoptionPlan": { "select": {
                        "progressPercentage": true, "completedTasks": true, "totalTasks": true
                    } }
                } }
            }
        }),
    )
}

fn build_customers_not_started(_: &Params) -> QueryConfig {
    find_many(
        "customer",
        json!({
            "where": {
                "deletedAt": null,
                "products": { "some": { "adoptionPlan": { "progressPercentage": 0 } } }
            },
            "select": {
                "id": true, "name": true, "createdAt": true,
                "products": { "select": {
                    "name": true,
                    "product": { "select": { "name": true } },
                    "adoptionPlan": { "select": { "totalTasks": true, "createdAt": true } }
                } }
            }
        }),
    )
}

fn build_list_adoption_plans(_: &Params) -> QueryConfig {
    find_many(
        "adoptionPlan",
        json!({
            "select": {
                "id": true, "productName": true, "licenseLevel": true,
                "progressPercentage": true, "completedTasks": true, "totalTasks": true,
                "customerProduct": { "select": {
                    "name": true, "customer": { "select": { "name": true } }
                } }
            },
            "orderBy": { "createdAt": "desc" }
        }),
    )
}

fn build_adoption_plans_for_customer(params: &Params) -> QueryConfig {
    find_many(
        "customer",
        json!({
            "where": {
                "deletedAt": null,
                "name": { "contains": params.json("customerName"), "mode": "insensitive" }
            },
            "select": {
                "id": true, "name": true,
                "products": { "select": {
                    "id": true, "name": true, "licenseLevel": true,
                    "product": { "select": { "name": true } },
                    "adoptionPlan": { "select": {
                        "progressPercentage": true, "completedTasks": true, "totalTasks": true
                    } }
                } },
                "solutions": { "select": {
                    "id": true, "name": true, "licenseLevel": true,
                    "solution": { "select": { "name": true } }
                } }
            }
        }),
    )
}

fn build_telemetry_no_criteria(_: &Params) -> QueryConfig {
    find_many(
        "telemetryAttribute",
        json!({
            "where": {
                "OR": [
                    { "successCriteria": { "equals": null } },
                    { "successCriteria": { "equals": {} } }
                ]
            },
            "select": {
                "id": true, "name": true, "dataType": true,
                "task": { "select": {
                    "id": true, "name": true,
                    "product": { "select": { "name": true } },
                    "solution": { "select": { "name": true } }
                } }
            }
        }),
    )
}

fn build_count_entities(_: &Params) -> QueryConfig {
    QueryConfig::new(
        AGGREGATE_MODEL,
        QueryOperation::Count,
        json!({ "models": ["product", "solution", "customer", "task"] }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_library_compiles_all_patterns() {
        let library = TemplateLibrary::standard();
        assert_eq!(library.templates().len(), 17);
        for t in library.templates() {
            assert!(!t.patterns.is_empty(), "{} has no patterns", t.id);
            assert!(!t.examples.is_empty(), "{} has no examples", t.id);
        }
    }

    #[test]
    fn ids_are_unique() {
        let library = TemplateLibrary::standard();
        let mut ids: Vec<_> = library.templates().iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), library.templates().len());
    }

    #[test]
    fn every_builder_targets_known_model() {
        let known = [
            "product",
            "task",
            "customer",
            "adoptionPlan",
            "telemetryAttribute",
            AGGREGATE_MODEL,
        ];
        let mut params = Params::new();
        params.insert("productName", ParamValue::String("X".into()));
        params.insert("customerName", ParamValue::String("Y".into()));
        for t in TemplateLibrary::standard().templates() {
            let config = t.build_query(&params);
            assert!(known.contains(&config.model.as_str()), "{}", t.id);
        }
    }

    #[test]
    fn list_products_builds_fixed_config() {
        let t = TemplateLibrary::standard().get("list_products").unwrap();
        let config = t.build_query(&Params::new());
        assert_eq!(config.model, "product");
        assert_eq!(config.operation, QueryOperation::FindMany);
        assert_eq!(config.args["where"], json!({ "deletedAt": null }));
        assert_eq!(config.args["orderBy"], json!({ "name": "asc" }));
    }

    #[test]
    fn low_adoption_uses_default_threshold() {
        let t = TemplateLibrary::standard().get("customers_low_adoption").unwrap();
        let config = t.build_query(&Params::new());
        assert_eq!(
            config.args["where"]["products"]["some"]["adoptionPlan"]["progressPercentage"]["lt"],
            json!(50.0)
        );
    }

    #[test]
    fn count_entities_is_aggregate() {
        let t = TemplateLibrary::standard().get("count_entities").unwrap();
        let config = t.build_query(&Params::new());
        assert!(config.is_aggregate());
        assert_eq!(config.operation, QueryOperation::Count);
        assert_eq!(config.args["models"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn missing_required_reports_names() {
        let t = TemplateLibrary::standard().get("tasks_for_product").unwrap();
        assert_eq!(t.missing_required(&Params::new()), vec!["productName"]);
    }

    #[test]
    fn related_questions_stay_in_category() {
        let library = TemplateLibrary::standard();
        let related = library.related_questions("list_customers", 5);
        assert_eq!(
            related,
            vec!["Show customers with adoption below 50%", "Show customers that have not started"]
        );
        assert!(library.related_questions("nope", 3).is_empty());
    }
}
