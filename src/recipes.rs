//! Feature recipes: the registration points a scaffolded feature is woven
//! into, expressed as patch plans.
//!
//! A recipe decides *what* to insert (imports, a seeder call, a container
//! binding, route declarations, a policy mapping) and *where* to look for
//! it. The engine does the rest, so running a recipe twice is harmless.

use crate::config::{Metadata, PatchConfig, PatchDefinition};
use crate::engine::{AnchorStrategy, Delimiter, Identity, InsertionSpec};
use heck::{ToKebabCase, ToUpperCamelCase};
use thiserror::Error;

pub const DATABASE_SEEDER: &str = "database/seeders/DatabaseSeeder.php";
pub const APP_SERVICE_PROVIDER: &str = "app/Providers/AppServiceProvider.php";
pub const AUTH_SERVICE_PROVIDER: &str = "app/Providers/AuthServiceProvider.php";
pub const WEB_ROUTES: &str = "routes/web.php";
pub const API_ROUTES: &str = "routes/api.php";

const CONTROLLER_NAMESPACE: &str = "App\\Http\\Controllers";
const SERVICE_NAMESPACE: &str = "App\\Services";
const RUN_METHOD: &str = "public function run()";
const REGISTER_METHOD: &str = "public function register()";
const EXAMPLE_USER_FACTORY: &str = "// \\App\\Models\\User::factory(10)->create();";
const SANCTUM_GROUP: &str = "Route::middleware('auth:sanctum')->group(function () {";
const POLICIES_PROPERTY: &str = "protected $policies = [";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecipeError {
    #[error("feature name cannot be empty")]
    EmptyName,

    #[error("invalid feature name '{0}': only letters, numbers, underscores and forward slashes are allowed")]
    InvalidName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerKind {
    #[default]
    Resource,
    Invokable,
    Basic,
}

/// Which registration points to weave the feature into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weavings {
    pub seeder: bool,
    pub service_binding: bool,
    pub web_routes: bool,
    pub api_routes: bool,
    pub policy: bool,
}

impl Default for Weavings {
    fn default() -> Self {
        Self {
            seeder: false,
            service_binding: false,
            web_routes: true,
            api_routes: false,
            policy: true,
        }
    }
}

/// Everything a recipe needs to know about the feature being scaffolded.
///
/// Built once, then only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDetails {
    /// Studly class stem, e.g. `OrderItem`
    pub name: String,
    /// Studly path segments preceding the name, e.g. `["Admin"]`
    pub sub_namespace: Vec<String>,
    pub controller_kind: ControllerKind,
    pub controller_namespace: String,
    pub web_route_path: String,
    pub weavings: Weavings,
}

impl FeatureDetails {
    /// Validate `raw_name` and derive the default details from it.
    ///
    /// `Admin/order_item` yields the name `OrderItem`, the sub-namespace
    /// `Admin` and the route path `order-items`.
    pub fn new(raw_name: &str) -> Result<Self, RecipeError> {
        let raw_name = raw_name.trim();
        validate_name(raw_name)?;

        let (parent, last) = raw_name.rsplit_once('/').unwrap_or(("", raw_name));
        let name = last.to_upper_camel_case();
        if name.is_empty() {
            return Err(RecipeError::InvalidName(raw_name.to_string()));
        }
        let segments: Vec<String> = parent
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.to_upper_camel_case())
            .collect();

        let controller_namespace = std::iter::once(CONTROLLER_NAMESPACE.to_string())
            .chain(segments.iter().cloned())
            .collect::<Vec<_>>()
            .join("\\");

        Ok(Self {
            web_route_path: pluralize(&name.to_kebab_case()),
            name,
            sub_namespace: segments,
            controller_kind: ControllerKind::default(),
            controller_namespace,
            weavings: Weavings::default(),
        })
    }

    pub fn with_controller_kind(mut self, kind: ControllerKind) -> Self {
        self.controller_kind = kind;
        self
    }

    pub fn with_controller_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.controller_namespace = namespace.into().replace('/', "\\");
        self
    }

    pub fn with_web_route_path(mut self, path: impl Into<String>) -> Self {
        self.web_route_path = path.into();
        self
    }

    pub fn with_weavings(mut self, weavings: Weavings) -> Self {
        self.weavings = weavings;
        self
    }

    pub fn controller(&self) -> String {
        format!("{}Controller", self.name)
    }

    pub fn kebab_name(&self) -> String {
        self.name.to_kebab_case()
    }

    /// Service namespace mirroring the controller's sub-namespace.
    pub fn service_namespace(&self) -> String {
        let sub = self
            .controller_namespace
            .strip_prefix(CONTROLLER_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('\\'))
            .filter(|rest| !rest.is_empty());
        match sub {
            Some(sub) => {
                let parts: Vec<String> = sub.split('\\').map(|p| p.to_upper_camel_case()).collect();
                format!("{SERVICE_NAMESPACE}\\{}", parts.join("\\"))
            }
            None => SERVICE_NAMESPACE.to_string(),
        }
    }

    /// Patch plan for every enabled weaving, in a stable order.
    pub fn plan(&self) -> PatchConfig {
        let mut patches = Vec::new();
        if self.weavings.seeder {
            patches.extend(self.seeder_patches());
        }
        if self.weavings.service_binding {
            patches.extend(self.service_binding_patches());
        }
        if self.weavings.web_routes {
            patches.extend(self.web_route_patches());
        }
        if self.weavings.api_routes {
            patches.extend(self.api_route_patches());
        }
        if self.weavings.policy {
            patches.extend(self.policy_patches());
        }

        PatchConfig {
            meta: Metadata {
                name: format!("{}-feature", self.kebab_name()),
                description: Some(format!("Registration points for the {} feature", self.name)),
                workspace_relative: true,
            },
            patches,
        }
    }

    pub fn seeder_patches(&self) -> Vec<PatchDefinition> {
        let seeder = format!("{}Seeder", self.name);
        let spec = InsertionSpec::new(
            &format!("$this->call({seeder}::class);"),
            format!("{seeder}::class"),
        )
        .anchor(AnchorStrategy::literal_before(EXAMPLE_USER_FACTORY).scoped_from(RUN_METHOD))
        .anchor(AnchorStrategy::block_body_end(RUN_METHOD));

        vec![definition("seeder-call", DATABASE_SEEDER, spec)]
    }

    pub fn service_binding_patches(&self) -> Vec<PatchDefinition> {
        let service = format!("{}Service", self.name);
        let interface = format!("{service}Interface");
        let namespace = self.service_namespace();
        let binding = format!("$this->app->bind({interface}::class, {service}::class);");

        vec![
            definition(
                "service-interface-import",
                APP_SERVICE_PROVIDER,
                import_spec(&format!("{namespace}\\Contracts\\{interface}")),
            ),
            definition(
                "service-class-import",
                APP_SERVICE_PROVIDER,
                import_spec(&format!("{namespace}\\{service}")),
            ),
            definition(
                "service-binding",
                APP_SERVICE_PROVIDER,
                InsertionSpec::self_identified(&binding)
                    .anchor(AnchorStrategy::block_body_start(REGISTER_METHOD)),
            ),
        ]
    }

    pub fn web_route_patches(&self) -> Vec<PatchDefinition> {
        let route = self.route_definition(&self.web_route_path, RouteFlavor::Web);
        let spec = InsertionSpec {
            fragment: vec![String::new(), route],
            identity: self.route_identity(&self.web_route_path),
            anchors: vec![AnchorStrategy::EndOfDocument],
        };

        vec![
            definition("web-controller-import", WEB_ROUTES, self.controller_import()),
            definition("web-route", WEB_ROUTES, spec),
        ]
    }

    pub fn api_route_patches(&self) -> Vec<PatchDefinition> {
        let path = pluralize(&self.kebab_name());
        let route = self.route_definition(&path, RouteFlavor::Api);
        let spec = InsertionSpec {
            fragment: vec![route],
            identity: self.route_identity(&path),
            anchors: vec![
                AnchorStrategy::block_body_end(SANCTUM_GROUP),
                AnchorStrategy::EndOfDocument,
            ],
        };

        vec![
            definition("api-controller-import", API_ROUTES, self.controller_import()),
            definition("api-route", API_ROUTES, spec),
        ]
    }

    pub fn policy_patches(&self) -> Vec<PatchDefinition> {
        let name = &self.name;
        let mapping = format!("{name}::class => {name}Policy::class,");
        let spec = InsertionSpec::new(&mapping, format!("{name}::class => {name}Policy::class"))
            .anchor(
                AnchorStrategy::block_body_start(POLICIES_PROPERTY).delimited_by(Delimiter::Bracket),
            );

        vec![
            definition(
                "policy-model-import",
                AUTH_SERVICE_PROVIDER,
                import_spec(&format!("App\\Models\\{name}")),
            ),
            definition(
                "policy-import",
                AUTH_SERVICE_PROVIDER,
                import_spec(&format!("App\\Policies\\{name}Policy")),
            ),
            definition("policy-mapping", AUTH_SERVICE_PROVIDER, spec),
        ]
    }

    fn controller_import(&self) -> InsertionSpec {
        import_spec(&format!("{}\\{}", self.controller_namespace, self.controller()))
    }

    /// A route counts as registered once both its path and controller appear.
    fn route_identity(&self, path: &str) -> Identity {
        Identity::ContainsAll(vec![path.to_string(), format!("{}::class", self.controller())])
    }

    fn route_definition(&self, path: &str, flavor: RouteFlavor) -> String {
        let controller = self.controller();
        let route_name = match flavor {
            RouteFlavor::Web => self.kebab_name(),
            RouteFlavor::Api => format!("api.{}", self.kebab_name()),
        };
        match (self.controller_kind, flavor) {
            (ControllerKind::Resource, RouteFlavor::Web) => {
                format!("Route::resource('{path}', {controller}::class);")
            }
            (ControllerKind::Resource, RouteFlavor::Api) => {
                format!("Route::apiResource('{path}', {controller}::class);")
            }
            (ControllerKind::Invokable, _) => {
                format!("Route::get('/{path}', {controller}::class)->name('{route_name}');")
            }
            (ControllerKind::Basic, _) => format!(
                "Route::get('/{path}', [{controller}::class, 'index'])->name('{route_name}.index');"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteFlavor {
    Web,
    Api,
}

/// `use` statement placed after the last top-level import, else after the
/// namespace declaration, else right after the opening tag.
///
/// Both statements may span several lines (grouped imports), so the
/// insertion follows the `;` that ends them.
pub fn import_spec(class: &str) -> InsertionSpec {
    InsertionSpec::self_identified(&format!("use {class};"))
        .anchor(AnchorStrategy::last_literal_after("\nuse ").through(";"))
        .anchor(AnchorStrategy::literal_after("\nnamespace ").through(";"))
        .anchor(AnchorStrategy::literal_after("<?php"))
}

fn definition(id: &str, file: &str, spec: InsertionSpec) -> PatchDefinition {
    PatchDefinition {
        id: id.to_string(),
        file: file.to_string(),
        spec,
    }
}

fn validate_name(raw_name: &str) -> Result<(), RecipeError> {
    let mut chars = raw_name.chars();
    let Some(first) = chars.next() else {
        return Err(RecipeError::EmptyName);
    };
    let valid_first = first.is_ascii_alphabetic() || first == '_' || first == '/';
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '/');
    if valid_first && valid_rest {
        Ok(())
    } else {
        Err(RecipeError::InvalidName(raw_name.to_string()))
    }
}

/// English plural of the last word of a kebab-case name.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if let Some(stem) = lower.strip_suffix('y') {
        let after_consonant = stem
            .bytes()
            .last()
            .is_some_and(|c| c.is_ascii_alphabetic() && !b"aeiou".contains(&c));
        if after_consonant {
            return format!("{}ies", &word[..stem.len()]);
        }
    }
    if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
    {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}
