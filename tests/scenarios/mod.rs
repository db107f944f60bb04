mod construction_failures;
mod get_replaces_body;
mod ordered_partial_failure;
mod transport_failure;
