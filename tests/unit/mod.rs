mod resource_fetch;
