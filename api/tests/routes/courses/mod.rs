mod statistics_test;
