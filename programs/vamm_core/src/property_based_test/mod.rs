mod math_property_tests;
