// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fetch-URI action

use crate::actions::ActionError;
use crate::context::ExecutionContext;
use forge_core::{expand_variables, resolve_path, StepResult};
use forge_procedure::FetchUriAction;

pub(crate) async fn execute(
    action: &FetchUriAction,
    ctx: &mut ExecutionContext,
) -> Result<StepResult, ActionError> {
    let uri = expand_variables(&action.uri, &ctx.results)?;
    let location = expand_variables(&action.location, &ctx.results)?;
    let destination = resolve_path(&location, &ctx.workdir)?;
    if ctx.fs.exists(&destination) && !action.overwrite {
        return Err(ActionError::AlreadyExists(destination));
    }

    let mut builder = reqwest::Client::builder();
    if let Some(proxy) = &action.proxy {
        let proxy = expand_variables(proxy, &ctx.results)?;
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    let client = builder.build()?;

    tracing::debug!(%uri, destination = %destination.display(), "fetching");
    let response = client.get(&uri).send().await?;
    let status = response.status();
    if !status.is_success() && !action.ignore_errors {
        return Err(ActionError::HttpStatus {
            uri,
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await?;
    ctx.fs.write(&destination, &body)?;
    Ok(StepResult::new())
}

#[cfg(test)]
#[path = "fetch_uri_tests.rs"]
mod tests;
