use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "helpdesk")]
#[command(version, about = "Helpdesk chatbot backed by Azure OpenAI", long_about = None)]
#[command(after_help = "Environment:
  KEY_VAULT_NAME           Key Vault holding the OpenAI-API-Key secret (required)
  AZURE_OPENAI_SERVICE     Azure OpenAI resource name (required)
  AZURE_OPENAI_DEPLOYMENT  Deployment to query [default: gpt-35-turbo]
  AZURE_OPENAI_ENDPOINT    Full endpoint URL, replaces the one derived from the service name")]
pub struct Cli {}
