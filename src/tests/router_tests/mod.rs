pub mod scrape_api_tests;
