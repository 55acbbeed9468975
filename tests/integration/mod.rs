mod sync_integration;
