use arty_client::{PropertyService, SearchParams, SearchService};
use arty_core::Error;
use tracing::{info, trace};

use crate::error::Result;
use crate::prop::{parse_props, render_props, Prop};
use crate::retry::Retrier;

/// Attach properties to every artifact matching `path`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetPropAction {
    pub path: String,
    pub recursive: bool,
    /// JSON or YAML list of properties, parsed by `validate`
    pub raw_props: String,
    pub props: Vec<Prop>,
}

impl SetPropAction {
    /// Parse `raw_props` when no properties were given directly, then check
    /// every property
    pub fn validate(&mut self) -> Result<()> {
        trace!("validating set prop plugin configuration");

        if self.path.is_empty() {
            return Err(Error::missing_field("set-prop path").into());
        }

        if self.props.is_empty() && !self.raw_props.trim().is_empty() {
            self.props = parse_props(&self.raw_props)?;
        }

        if self.props.is_empty() {
            return Err(Error::missing_field("set-prop props").into());
        }

        for prop in &self.props {
            prop.validate()?;
        }
        Ok(())
    }

    pub async fn exec<S>(&self, client: &S, retrier: &Retrier) -> Result<()>
    where
        S: SearchService + PropertyService + ?Sized,
    {
        trace!("running set-prop with provided configuration");

        let rendered = render_props(&self.props);
        let search = SearchParams::new(&self.path).recursive(self.recursive);
        let search = &search;

        let items = retrier
            .run("search", &self.path, move || async move {
                client.search(search).await
            })
            .await?;

        let (items, properties, recursive) = (&items, rendered.as_str(), self.recursive);
        let updated = retrier
            .run("set-prop", &self.path, move || async move {
                client.set_properties(items, properties, recursive).await
            })
            .await?;

        info!(path = %self.path, properties = %rendered, updated, "set-prop complete");
        Ok(())
    }
}
