use crate::backend::CompanyProfile;
use crate::cli::commands::CompaniesArgs;
use crate::cli::context::AppContext;
use crate::errors::HyperMailError;
use crate::repl::renderer;

pub fn profile_from_args(args: &CompaniesArgs) -> CompanyProfile {
    let pick = |v: &Option<String>| v.clone().unwrap_or_default();
    CompanyProfile {
        industry: pick(&args.industry),
        size: pick(&args.size),
        sector: pick(&args.sector),
        location: pick(&args.location),
        vibe: pick(&args.vibe),
        details: pick(&args.details),
    }
    .with_defaults()
}

pub async fn handle_companies(ctx: &AppContext, args: CompaniesArgs) -> Result<(), HyperMailError> {
    let coordinator = ctx.coordinator(None)?;
    let companies = coordinator.find_companies(profile_from_args(&args)).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&companies)?);
    } else {
        println!("{}", renderer::render_companies(&companies));
    }
    Ok(())
}
